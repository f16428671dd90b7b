//! Target-side server facade.
//!
//! Owns the shared state and exposes the operations an embedding process
//! needs: serve, broadcast events, inspect attached controllers, shut down.

use std::sync::Arc;

use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use amonitor_core::error::{AmonitorError, Result};

use crate::app_state::SdkState;
use crate::config::SdkConfig;
use crate::dispatch::ActionHandler;
use crate::realtime::{BroadcastReport, EventBroadcaster};
use crate::router;

pub struct SdkServer {
    state: SdkState,
}

impl SdkServer {
    pub fn new(cfg: SdkConfig, handler: Arc<dyn ActionHandler>) -> Result<Self> {
        Ok(Self {
            state: SdkState::new(cfg, handler)?,
        })
    }

    pub fn state(&self) -> &SdkState {
        &self.state
    }

    pub fn router(&self) -> Router {
        router::build_router(self.state.clone())
    }

    /// Bind `server.listen` and serve until [`shutdown`](Self::shutdown).
    pub async fn run(&self) -> Result<()> {
        let listen = self.state.cfg().server.listen_addr()?;
        let listener = TcpListener::bind(listen)
            .await
            .map_err(|e| AmonitorError::Transport(format!("bind {listen} failed: {e}")))?;
        self.serve(listener).await
    }

    /// Serve on an already-bound listener until [`shutdown`](Self::shutdown).
    pub async fn serve(&self, listener: TcpListener) -> Result<()> {
        let local = listener
            .local_addr()
            .map_err(|e| AmonitorError::Transport(e.to_string()))?;
        tracing::info!(
            %local,
            target_id = %self.state.target_id(),
            "amonitor sdk server listening"
        );

        let shutdown = self.state.shutdown_token().clone();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await
            .map_err(|e| AmonitorError::Transport(format!("server failed: {e}")))
    }

    pub fn broadcaster(&self) -> EventBroadcaster {
        self.state.broadcaster().clone()
    }

    /// Push one `event` envelope to every attached controller.
    pub async fn emit_event(&self, event_name: &str, data: Value) -> BroadcastReport {
        self.state.broadcaster().broadcast(event_name, data).await
    }

    pub fn connection_count(&self) -> usize {
        self.state.registry().len()
    }

    /// Stop accepting connections and close every session with 1001.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        self.state.shutdown_token().cancel();
    }
}
