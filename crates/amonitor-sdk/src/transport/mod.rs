//! Transport layer (WebSocket).
//!
//! Exposes the upgrade handler and connection supervisor, the bearer
//! handshake check, and the codec that decodes frames once before dispatch.

pub mod codec;
pub mod handshake;
pub mod ws;
