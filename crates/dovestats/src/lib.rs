//! Top-level facade crate for dovestats.
//!
//! Re-exports the protocol core and the exporter library so users can depend on a single crate.

pub mod core {
    pub use dovestats_core::*;
}

pub mod exporter {
    pub use dovestats_exporter::*;
}
