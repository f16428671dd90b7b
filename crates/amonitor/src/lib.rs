//! Top-level facade crate for AMonitor.
//!
//! Re-exports the wire contracts and the target-side SDK so embedders can depend on a single crate.

pub mod core {
    pub use amonitor_core::*;
}

pub mod sdk {
    pub use amonitor_sdk::*;
}
