//! dovestats exporter library entry.
//!
//! Wires configuration, the scope collector, exposition rendering and the
//! HTTP endpoints into a Prometheus exporter for Dovecot's stats socket. It is
//! consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod collector;
pub mod config;
pub mod obs;
pub mod ops;
pub mod router;
