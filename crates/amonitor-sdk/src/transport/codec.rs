//! Decode-once codec for the transport layer.
//!
//! - Text frames => Envelope
//! - Binary frames => Envelope, if the bytes are UTF-8 JSON
//! - Ping/Pong/Close are surfaced for lifecycle management

use amonitor_core::{
    error::{AmonitorError, Result},
    protocol, Envelope,
};
use axum::extract::ws::Message;

#[derive(Debug)]
pub enum Inbound {
    Envelope(Envelope),
    Ping(Vec<u8>),
    Pong,
    Close,
}

/// `Err` is always `AmonitorError::Decode`; the caller reports it and keeps reading.
pub fn decode(msg: Message) -> Result<Inbound> {
    match msg {
        Message::Text(s) => Ok(Inbound::Envelope(protocol::decode(&s)?)),
        Message::Binary(b) => {
            let s = String::from_utf8(b)
                .map_err(|_| AmonitorError::Decode("binary frame is not UTF-8 text".into()))?;
            Ok(Inbound::Envelope(protocol::decode(&s)?))
        }
        Message::Ping(v) => Ok(Inbound::Ping(v)),
        Message::Pong(_) => Ok(Inbound::Pong),
        Message::Close(_) => Ok(Inbound::Close),
    }
}
