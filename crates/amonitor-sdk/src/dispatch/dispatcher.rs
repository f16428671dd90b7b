use std::any::Any;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};

use amonitor_core::error::Result;
use amonitor_core::protocol::payload::{ActionOutcome, ActionRequest};
use amonitor_core::{Envelope, MsgType};

/// Business logic behind `action` envelopes, supplied by the embedding process.
///
/// Returning `Err` (or panicking) still yields an `action_ack` with
/// `success: false`.
#[async_trait]
pub trait ActionHandler: Send + Sync + 'static {
    async fn handle(&self, action: &str, params: Map<String, Value>) -> Result<ActionOutcome>;
}

/// Adapter that turns an async closure into an [`ActionHandler`].
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> ActionHandler for FnHandler<F>
where
    F: Fn(String, Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ActionOutcome>> + Send + 'static,
{
    async fn handle(&self, action: &str, params: Map<String, Value>) -> Result<ActionOutcome> {
        (self.f)(action.to_owned(), params).await
    }
}

/// `handler_fn(|action, params| async move { ... })`
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn ActionHandler>
where
    F: Fn(String, Map<String, Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ActionOutcome>> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Maps inbound envelopes to handler calls and builds acknowledgements.
pub struct Dispatcher {
    target_id: Arc<str>,
    handler: Arc<dyn ActionHandler>,
}

impl Dispatcher {
    pub fn new(target_id: Arc<str>, handler: Arc<dyn ActionHandler>) -> Self {
        Self { target_id, handler }
    }

    /// Returns the reply to send, if any. Only `action` gets one.
    pub async fn dispatch(&self, env: &Envelope) -> Option<Envelope> {
        match &env.msg_type {
            MsgType::Action => Some(self.handle_action(env).await),
            MsgType::Chat => {
                tracing::debug!(msg_id = %env.msg_id, "chat envelope ignored");
                None
            }
            other => {
                tracing::debug!(
                    msg_id = %env.msg_id,
                    msg_type = other.as_str(),
                    "non-action envelope ignored"
                );
                None
            }
        }
    }

    /// Run the handler on its own task and always produce an ack.
    ///
    /// If the caller drops this future mid-flight the spawned task keeps
    /// running and its result is discarded.
    pub async fn handle_action(&self, env: &Envelope) -> Envelope {
        let ActionRequest { action, params } = ActionRequest::from_envelope(env);
        tracing::info!(msg_id = %env.msg_id, action = %action, "action received");

        let started = Instant::now();
        let handler = Arc::clone(&self.handler);
        let name = action.clone();
        let joined = tokio::spawn(async move { handler.handle(&name, params).await }).await;

        let outcome = match joined {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                tracing::warn!(
                    action = %action,
                    code = e.client_code().as_str(),
                    error = %e,
                    "action handler returned error"
                );
                ActionOutcome::failure(format!("action '{action}' failed: {e}"))
            }
            Err(join) if join.is_panic() => {
                let detail = panic_detail(join.into_panic());
                tracing::error!(action = %action, panic = %detail, "action handler panicked");
                ActionOutcome::failure(format!("action '{action}' panicked: {detail}"))
            }
            Err(_) => ActionOutcome::failure(format!("action '{action}' was cancelled")),
        };

        tracing::debug!(
            msg_id = %env.msg_id,
            ok = outcome.ok,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "action handled"
        );
        Envelope::action_ack(&self.target_id, env, &outcome)
    }
}

fn panic_detail(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_owned()
    }
}
