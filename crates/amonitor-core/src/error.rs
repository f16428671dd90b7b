//! Shared error type across AMonitor crates.

use thiserror::Error;

/// Client-facing error codes (stable API).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientCode {
    /// Inbound text is not a well-formed envelope.
    DecodeError,
    /// Bearer credential missing or wrong.
    Unauthorized,
    /// The action handler failed.
    HandlerFailed,
    /// Transport-level failure (socket closed, queue gone).
    Transport,
    /// Configuration rejected at load time.
    BadConfig,
    /// Unsupported config/protocol version.
    UnsupportedVersion,
    /// Internal error.
    Internal,
}

impl ClientCode {
    /// String representation used in logs and error payloads.
    pub fn as_str(self) -> &'static str {
        match self {
            ClientCode::DecodeError => "DECODE_ERROR",
            ClientCode::Unauthorized => "UNAUTHORIZED",
            ClientCode::HandlerFailed => "HANDLER_FAILED",
            ClientCode::Transport => "TRANSPORT",
            ClientCode::BadConfig => "BAD_CONFIG",
            ClientCode::UnsupportedVersion => "UNSUPPORTED_VERSION",
            ClientCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, AmonitorError>;

/// Unified error type used by core and sdk.
#[derive(Debug, Error)]
pub enum AmonitorError {
    #[error("invalid envelope: {0}")]
    Decode(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error("action handler failed: {0}")]
    Handler(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("unsupported version")]
    UnsupportedVersion,
    #[error("internal: {0}")]
    Internal(String),
}

impl AmonitorError {
    /// Map internal error to a stable client-facing code.
    pub fn client_code(&self) -> ClientCode {
        match self {
            AmonitorError::Decode(_) => ClientCode::DecodeError,
            AmonitorError::Unauthorized => ClientCode::Unauthorized,
            AmonitorError::Handler(_) => ClientCode::HandlerFailed,
            AmonitorError::Transport(_) => ClientCode::Transport,
            AmonitorError::Config(_) => ClientCode::BadConfig,
            AmonitorError::UnsupportedVersion => ClientCode::UnsupportedVersion,
            AmonitorError::Internal(_) => ClientCode::Internal,
        }
    }
}
