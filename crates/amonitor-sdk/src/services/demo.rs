use async_trait::async_trait;
use serde_json::{Map, Value};

use amonitor_core::error::Result;
use amonitor_core::protocol::payload::ActionOutcome;

use crate::dispatch::ActionHandler;

/// Demo handler served by the bundled binary.
///
/// - `restart`: always accepted
/// - `print_message`: logs `params.message` (or `params.value`) and echoes it
/// - anything else: `ok: false`
#[derive(Debug, Default)]
pub struct DemoActionHandler;

impl DemoActionHandler {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ActionHandler for DemoActionHandler {
    async fn handle(&self, action: &str, params: Map<String, Value>) -> Result<ActionOutcome> {
        match action {
            "restart" => Ok(ActionOutcome::success(format!(
                "restart accepted with params={}",
                Value::Object(params)
            ))),
            "print_message" => {
                let message = message_param(&params);
                tracing::info!(action, message = %message, "print_message");
                Ok(ActionOutcome::success(format!(
                    "received action={action} message={message}"
                )))
            }
            other => Ok(ActionOutcome::failure(format!("unsupported action: {other}"))),
        }
    }
}

// `message` wins over `value`; non-string values are rendered as JSON.
fn message_param(params: &Map<String, Value>) -> String {
    match params.get("message").or_else(|| params.get("value")) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
