//! dovestats core: the Dovecot stats `EXPORT` protocol decoder and error types.
//!
//! This crate turns the line-oriented text that Dovecot's stats socket sends in
//! answer to an `EXPORT` request into typed measurement records. It carries no
//! transport or runtime dependencies, so the decoder can be driven from a
//! blocking reader, an async line loop, or a test fixture alike.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! Malformed input surfaces as `DoveStatsError`, never as a crash.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{DoveStatsError, ErrorKind, Result};
