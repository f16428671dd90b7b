//! Protocol modules (JSON envelope lane).
//!
//! - `envelope`: the wire envelope, its type tag, and the encode/decode codec.
//! - `payload`: typed views over the per-type payload mapping.
//!
//! Decoding is panic-free: malformed input is reported as
//! `AmonitorError::Decode` so the caller can answer with an `error` envelope
//! and keep the connection open.

pub mod envelope;
pub mod payload;

pub use envelope::{decode, encode};
