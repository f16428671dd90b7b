//! Shared state for one target process.
//!
//! Wires config, bearer check, connection registry, dispatcher and event
//! broadcaster together behind a cheap `Clone` handle for axum.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use amonitor_core::error::Result;

use crate::config::SdkConfig;
use crate::dispatch::{ActionHandler, Dispatcher};
use crate::realtime::{ConnectionRegistry, EventBroadcaster};
use crate::transport::handshake::BearerAuth;

#[derive(Clone)]
pub struct SdkState {
    inner: Arc<SdkStateInner>,
}

struct SdkStateInner {
    cfg: SdkConfig,
    target_id: Arc<str>,
    auth: BearerAuth,
    registry: Arc<ConnectionRegistry>,
    dispatcher: Dispatcher,
    broadcaster: EventBroadcaster,
    shutdown: CancellationToken,
}

impl SdkState {
    /// Build state from a config; fails on an invalid config instead of panicking.
    pub fn new(cfg: SdkConfig, handler: Arc<dyn ActionHandler>) -> Result<Self> {
        cfg.validate()?;

        let target_id: Arc<str> = Arc::from(cfg.target.id.as_str());
        let registry = Arc::new(ConnectionRegistry::new());
        let auth = BearerAuth::new(cfg.target.auth_token());
        let dispatcher = Dispatcher::new(Arc::clone(&target_id), handler);
        let broadcaster = EventBroadcaster::new(
            Arc::clone(&registry),
            Arc::clone(&target_id),
            cfg.server.broadcast_timeout(),
        );

        if auth.required() {
            tracing::info!(target_id = %target_id, "bearer auth enabled");
        }

        Ok(Self {
            inner: Arc::new(SdkStateInner {
                cfg,
                target_id,
                auth,
                registry,
                dispatcher,
                broadcaster,
                shutdown: CancellationToken::new(),
            }),
        })
    }

    pub fn cfg(&self) -> &SdkConfig {
        &self.inner.cfg
    }

    pub fn target_id(&self) -> Arc<str> {
        Arc::clone(&self.inner.target_id)
    }

    pub fn auth(&self) -> &BearerAuth {
        &self.inner.auth
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.inner.registry)
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.inner.dispatcher
    }

    pub fn broadcaster(&self) -> &EventBroadcaster {
        &self.inner.broadcaster
    }

    /// Process-wide shutdown token; sessions hold child tokens.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }
}
