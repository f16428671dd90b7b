//! Event fan-out to every registered connection.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use futures_util::stream::FuturesUnordered;
use futures_util::StreamExt;
use serde_json::Value;
use tokio::time::timeout;

use amonitor_core::protocol::encode;
use amonitor_core::Envelope;

use crate::realtime::registry::ConnectionRegistry;

/// Outcome of one broadcast call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections in the registry snapshot.
    pub attempted: usize,
    /// Copies accepted by a connection's outbound queue.
    pub delivered: usize,
}

/// Pushes `event` envelopes to all active connections.
///
/// Encodes once and sends N copies concurrently, each bounded by a timeout.
/// A failing recipient is logged and skipped; removing it is left to its
/// own supervisor.
#[derive(Clone)]
pub struct EventBroadcaster {
    registry: Arc<ConnectionRegistry>,
    target_id: Arc<str>,
    send_timeout: Duration,
}

impl EventBroadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        target_id: Arc<str>,
        send_timeout: Duration,
    ) -> Self {
        Self {
            registry,
            target_id,
            send_timeout,
        }
    }

    pub async fn broadcast(&self, event_name: &str, data: Value) -> BroadcastReport {
        let env = Envelope::event(&self.target_id, event_name, data);
        let text = match encode(&env) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(event_name, error = %e, "event encode failed");
                return BroadcastReport::default();
            }
        };

        let recipients = self.registry.snapshot();
        let attempted = recipients.len();
        let dur = self.send_timeout;

        let mut futs = FuturesUnordered::new();
        for conn in recipients {
            let msg = Message::Text(text.clone());
            futs.push(async move {
                let ok = matches!(timeout(dur, conn.tx.send(msg)).await, Ok(Ok(())));
                (conn.id, ok)
            });
        }

        let mut delivered = 0;
        while let Some((conn_id, ok)) = futs.next().await {
            if ok {
                delivered += 1;
            } else {
                tracing::warn!(conn_id, event_name, "event not delivered to connection");
            }
        }

        tracing::debug!(event_name, attempted, delivered, "event broadcast");
        BroadcastReport {
            attempted,
            delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::registry::Connection;
    use serde_json::json;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn reaches_every_connection_and_isolates_failures() {
        let reg = Arc::new(ConnectionRegistry::new());
        let mut alive = Vec::new();
        for _ in 0..3 {
            let (tx, rx) = mpsc::channel(4);
            reg.insert(Connection { id: reg.next_id(), tx });
            alive.push(rx);
        }
        let (dead_tx, dead_rx) = mpsc::channel(4);
        reg.insert(Connection { id: reg.next_id(), tx: dead_tx });
        drop(dead_rx);

        let b = EventBroadcaster::new(
            Arc::clone(&reg),
            Arc::from("svc-a"),
            Duration::from_millis(100),
        );
        let report = b.broadcast("deploy_done", json!({"v": "1.2"})).await;

        assert_eq!(report, BroadcastReport { attempted: 4, delivered: 3 });
        assert_eq!(reg.len(), 4, "broadcaster must not prune failing connections");

        for rx in alive.iter_mut() {
            let Some(Message::Text(s)) = rx.recv().await else { panic!("missing event") };
            let v: Value = serde_json::from_str(&s).unwrap();
            assert_eq!(v["type"], "event");
            assert_eq!(v["payload"]["event_name"], "deploy_done");
            assert_eq!(v["payload"]["data"], json!({"v": "1.2"}));
            assert_eq!(v["payload"]["target_id"], "svc-a");
        }
    }

    #[tokio::test]
    async fn full_queue_times_out_without_blocking_others() {
        let reg = Arc::new(ConnectionRegistry::new());
        let (full_tx, _full_rx) = mpsc::channel(1);
        full_tx.try_send(Message::Text("filler".into())).unwrap();
        reg.insert(Connection { id: reg.next_id(), tx: full_tx });
        let (tx, mut rx) = mpsc::channel(4);
        reg.insert(Connection { id: reg.next_id(), tx });

        let b = EventBroadcaster::new(
            Arc::clone(&reg),
            Arc::from("svc-a"),
            Duration::from_millis(30),
        );
        let report = b.broadcast("tick", json!({})).await;

        assert_eq!(report.attempted, 2);
        assert_eq!(report.delivered, 1);
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn empty_registry_is_a_no_op() {
        let b = EventBroadcaster::new(
            Arc::new(ConnectionRegistry::new()),
            Arc::from("svc-a"),
            Duration::from_millis(30),
        );
        assert_eq!(b.broadcast("tick", json!({})).await, BroadcastReport::default());
    }
}
