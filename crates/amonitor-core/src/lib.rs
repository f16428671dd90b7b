//! AMonitor core: transport-agnostic envelope model, codec, and error types.
//!
//! This crate defines the wire-level contracts shared by the target-side SDK
//! and any tooling that speaks to it. It intentionally carries no transport or
//! runtime dependencies so it can be reused in multiple contexts.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths must surface as `AmonitorError`/`Result` so a target
//! process does not crash on malformed input from a controller.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{AmonitorError, ClientCode, Result};
pub use protocol::envelope::{Envelope, MsgType};

/// WebSocket close code sent when the bearer credential is missing or wrong.
pub const UNAUTHORIZED_CLOSE_CODE: u16 = 4401;

/// WebSocket close code sent when the target process is shutting down.
pub const GOING_AWAY_CLOSE_CODE: u16 = 1001;
