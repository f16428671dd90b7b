//! Axum router wiring (HTTP -> WS upgrade).
//!
//! Every path upgrades: controllers are configured with a bare `ws://host:port`
//! or any path under it.

use axum::{routing::get, Router};

use crate::{app_state::SdkState, transport};

pub fn build_router(state: SdkState) -> Router {
    Router::new()
        .route("/", get(transport::ws::ws_upgrade))
        .fallback(transport::ws::ws_upgrade)
        .with_state(state)
}
