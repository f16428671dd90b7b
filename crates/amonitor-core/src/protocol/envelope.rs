//! Envelope model and codec (JSON, one envelope per transport frame).
//!
//! Outbound encoding always carries `msg_id`, `type`, `timestamp` and
//! `payload`; `trace_id` and `target_id` are omitted when absent.
//! Inbound decoding tolerates missing optional fields and ignores unknown
//! top-level keys. Unknown payload keys stay in `payload` untouched.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{AmonitorError, Result};
use crate::protocol::payload::{
    to_map, AckPayload, ActionOutcome, ErrorPayload, EventPayload, HeartbeatPayload,
};

/// Envelope type tag (field name is `type` in JSON).
///
/// `Other` keeps whatever unrecognised tag the peer sent (including an empty
/// string when `type` is missing) so it can be logged and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum MsgType {
    Action,
    ActionAck,
    Heartbeat,
    Event,
    Error,
    /// Operator chat line. No payload contract; never dispatched.
    Chat,
    Other(String),
}

impl MsgType {
    pub fn as_str(&self) -> &str {
        match self {
            MsgType::Action => "action",
            MsgType::ActionAck => "action_ack",
            MsgType::Heartbeat => "heartbeat",
            MsgType::Event => "event",
            MsgType::Error => "error",
            MsgType::Chat => "chat",
            MsgType::Other(s) => s.as_str(),
        }
    }
}

impl Default for MsgType {
    fn default() -> Self {
        MsgType::Other(String::new())
    }
}

impl From<String> for MsgType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "action" => MsgType::Action,
            "action_ack" => MsgType::ActionAck,
            "heartbeat" => MsgType::Heartbeat,
            "event" => MsgType::Event,
            "error" => MsgType::Error,
            "chat" => MsgType::Chat,
            _ => MsgType::Other(s),
        }
    }
}

impl From<MsgType> for String {
    fn from(t: MsgType) -> Self {
        match t {
            MsgType::Other(s) => s,
            known => known.as_str().to_owned(),
        }
    }
}

/// The unit of wire exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Sender-assigned identifier; acks echo it back as `action_msg_id`.
    #[serde(default, deserialize_with = "lenient_string")]
    pub msg_id: String,
    /// Optional correlation token, opaque to this crate.
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub trace_id: Option<String>,
    #[serde(rename = "type", default, deserialize_with = "lenient_type")]
    pub msg_type: MsgType,
    #[serde(
        default,
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub target_id: Option<String>,
    /// Milliseconds since the Unix epoch. Advisory only.
    #[serde(default, deserialize_with = "lenient_millis")]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "object_or_null")]
    pub payload: Map<String, Value>,
}

impl Envelope {
    fn outbound(msg_type: MsgType, target_id: &str, payload: Map<String, Value>) -> Self {
        Self {
            msg_id: Uuid::new_v4().to_string(),
            trace_id: None,
            msg_type,
            target_id: Some(target_id.to_owned()),
            timestamp: now_millis(),
            payload,
        }
    }

    /// Liveness envelope: `{target_id, status: "up"}`.
    pub fn heartbeat(target_id: &str) -> Self {
        let payload = HeartbeatPayload {
            target_id: target_id.to_owned(),
            status: "up".to_owned(),
        };
        Self::outbound(MsgType::Heartbeat, target_id, to_map(&payload))
    }

    /// Acknowledgement for `request`, echoing its `msg_id` and `trace_id`.
    pub fn action_ack(target_id: &str, request: &Envelope, outcome: &ActionOutcome) -> Self {
        let payload = AckPayload {
            action_msg_id: request.msg_id.clone(),
            success: outcome.ok,
            message: outcome.message.clone(),
        };
        let mut env = Self::outbound(MsgType::ActionAck, target_id, to_map(&payload));
        env.trace_id = request.trace_id.clone();
        env
    }

    /// Unsolicited event: `{target_id, event_name, data}`.
    pub fn event(target_id: &str, event_name: &str, data: Value) -> Self {
        let payload = EventPayload {
            target_id: target_id.to_owned(),
            event_name: event_name.to_owned(),
            data,
        };
        Self::outbound(MsgType::Event, target_id, to_map(&payload))
    }

    /// Soft error reported back to the peer: `{message}`.
    pub fn error(target_id: &str, message: impl Into<String>) -> Self {
        let payload = ErrorPayload {
            message: message.into(),
        };
        Self::outbound(MsgType::Error, target_id, to_map(&payload))
    }

    pub fn is_action(&self) -> bool {
        self.msg_type == MsgType::Action
    }
}

/// Decode one frame of text into an envelope.
///
/// The top level must be a JSON object; arrays and scalars are rejected even
/// though serde would accept a positional array for a struct. Header fields
/// never fail decoding on their JSON type: `msg_id`, `trace_id` and
/// `target_id` fall back to the JSON text of a non-string value, a
/// non-integer `timestamp` is truncated or zeroed, and a non-string `type`
/// is unrecognised. Only a non-object `payload` is rejected.
pub fn decode(text: &str) -> Result<Envelope> {
    let obj: Map<String, Value> =
        serde_json::from_str(text).map_err(|e| AmonitorError::Decode(e.to_string()))?;
    serde_json::from_value(Value::Object(obj)).map_err(|e| AmonitorError::Decode(e.to_string()))
}

/// Encode an envelope to its wire text.
pub fn encode(env: &Envelope) -> Result<String> {
    serde_json::to_string(env)
        .map_err(|e| AmonitorError::Internal(format!("envelope encode failed: {e}")))
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}

fn object_or_null<'de, D>(de: D) -> std::result::Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Map<String, Value>>::deserialize(de)?.unwrap_or_default())
}

/// `null` becomes empty, any other non-string keeps its JSON text.
fn value_text(v: Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

fn lenient_string<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(de)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D>(de: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(de)?))
}

fn lenient_type<'de, D>(de: D) -> std::result::Result<MsgType, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(Value::deserialize(de)?)
        .map(MsgType::from)
        .unwrap_or_default())
}

fn lenient_millis<'de, D>(de: D) -> std::result::Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let ms = match Value::deserialize(de)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    };
    Ok(ms)
}
