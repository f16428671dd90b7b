//! Typed payloads, one per envelope type.
//!
//! The envelope keeps `payload` as an open JSON mapping; these types are the
//! shapes this crate writes and the lenient view it reads for `action`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::protocol::envelope::Envelope;

/// Inbound `action` request. Both fields fall back to empty values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionRequest {
    pub action: String,
    pub params: Map<String, Value>,
}

impl ActionRequest {
    /// Lenient extraction: a non-string `action` becomes `""` and a
    /// non-object `params` becomes `{}`.
    pub fn from_envelope(env: &Envelope) -> Self {
        let action = env
            .payload
            .get("action")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let params = env
            .payload
            .get("params")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        Self { action, params }
    }
}

/// Result returned by an action handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub ok: bool,
    #[serde(default)]
    pub message: String,
}

impl ActionOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckPayload {
    pub action_msg_id: String,
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub target_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventPayload {
    pub target_id: String,
    pub event_name: String,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub message: String,
}

/// Flatten a payload struct into the envelope's open mapping.
pub(crate) fn to_map<T: Serialize>(payload: &T) -> Map<String, Value> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => map,
        Ok(other) => {
            tracing::warn!(kind = ?other, "payload did not serialize to an object");
            Map::new()
        }
        Err(e) => {
            tracing::warn!(error = %e, "payload serialize failed");
            Map::new()
        }
    }
}
