//! AMonitor SDK demo target.
//!
//! Serves the demo action handler on the address from `amonitor.yaml`
//! (override the path with `AMONITOR_CONFIG`). Ctrl+C / SIGTERM close all
//! sessions with 1001 and stop the listener.

use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use amonitor_core::error::Result;
use amonitor_sdk::{config, services::DemoActionHandler, SdkServer};

#[tokio::main]
async fn main() -> Result<()> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::var("AMONITOR_CONFIG").unwrap_or_else(|_| "amonitor.yaml".into());
    let cfg = config::load_from_file(&path)?;

    let server = Arc::new(SdkServer::new(cfg, Arc::new(DemoActionHandler::new()))?);
    {
        let server = Arc::clone(&server);
        tokio::spawn(async move {
            shutdown_signal().await;
            server.shutdown();
        });
    }

    server.run().await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
}
