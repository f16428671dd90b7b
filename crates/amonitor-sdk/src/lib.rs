//! AMonitor target-side SDK.
//!
//! This crate wires the transport, bearer handshake, action dispatcher,
//! heartbeat emitter and event broadcaster into a server a target process
//! embeds. It is consumed by the demo binary (`main.rs`) and by integration
//! tests.

pub mod app_state;
pub mod config;
pub mod dispatch;
pub mod realtime;
pub mod router;
pub mod server;
pub mod services;
pub mod transport;

pub use app_state::SdkState;
pub use config::SdkConfig;
pub use dispatch::{handler_fn, ActionHandler, Dispatcher};
pub use realtime::{BroadcastReport, ConnectionRegistry, EventBroadcaster};
pub use server::SdkServer;
