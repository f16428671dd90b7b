//! Realtime runtime for the target side.
//!
//! Connection registry, per-connection heartbeat, and event fan-out.

pub mod broadcast;
pub mod heartbeat;
pub mod registry;

pub use broadcast::{BroadcastReport, EventBroadcaster};
pub use heartbeat::{run_heartbeat, HeartbeatExit};
pub use registry::{ConnId, Connection, ConnectionRegistry};
