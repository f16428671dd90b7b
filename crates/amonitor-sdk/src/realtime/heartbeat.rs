//! Per-connection heartbeat emitter.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::Message;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use amonitor_core::protocol::encode;
use amonitor_core::Envelope;

/// Why the heartbeat loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatExit {
    /// The supervisor cancelled it during teardown.
    Cancelled,
    /// The outbound queue is gone; the supervisor will notice on its own.
    QueueClosed,
}

/// Emit a `heartbeat` envelope every `period` until cancelled.
///
/// The first heartbeat goes out immediately. A failed enqueue ends the loop
/// quietly; registry cleanup belongs to the supervisor.
pub async fn run_heartbeat(
    tx: mpsc::Sender<Message>,
    target_id: Arc<str>,
    period: Duration,
    cancel: CancellationToken,
) -> HeartbeatExit {
    let mut tick = time::interval(period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return HeartbeatExit::Cancelled,
            _ = tick.tick() => {}
        }

        let text = match encode(&Envelope::heartbeat(&target_id)) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(error = %e, "heartbeat encode failed");
                continue;
            }
        };

        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => return HeartbeatExit::Cancelled,
            r = tx.send(Message::Text(text)) => r,
        };
        if sent.is_err() {
            return HeartbeatExit::QueueClosed;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tokio::time::{timeout, Instant};

    fn parse(msg: Message) -> Value {
        match msg {
            Message::Text(s) => serde_json::from_str(&s).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[tokio::test]
    async fn first_beat_is_immediate_then_periodic() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let period = Duration::from_millis(200);
        let handle = tokio::spawn(run_heartbeat(tx, Arc::from("svc-a"), period, cancel.clone()));

        let start = Instant::now();
        let first = parse(timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap());
        assert_eq!(first["type"], "heartbeat");
        assert_eq!(first["payload"]["status"], "up");
        assert_eq!(first["payload"]["target_id"], "svc-a");
        assert!(start.elapsed() < period);

        let _second = timeout(Duration::from_secs(1), rx.recv()).await.unwrap().unwrap();
        assert!(start.elapsed() >= period);

        cancel.cancel();
        assert_eq!(handle.await.unwrap(), HeartbeatExit::Cancelled);
    }

    #[tokio::test]
    async fn no_beats_after_cancel() {
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_heartbeat(
            tx,
            Arc::from("svc-a"),
            Duration::from_millis(20),
            cancel.clone(),
        ));

        let _ = rx.recv().await;
        cancel.cancel();
        handle.await.unwrap();

        while rx.try_recv().is_ok() {}
        time::sleep(Duration::from_millis(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn stops_when_queue_closed() {
        let (tx, rx) = mpsc::channel(8);
        drop(rx);
        let exit = run_heartbeat(
            tx,
            Arc::from("svc-a"),
            Duration::from_millis(10),
            CancellationToken::new(),
        )
        .await;
        assert_eq!(exit, HeartbeatExit::QueueClosed);
    }
}
