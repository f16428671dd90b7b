//! WebSocket upgrade handler and connection supervisor.
//!
//! Responsibilities:
//! - Bearer check on the upgrade request, close with 4401 on mismatch
//! - Register the connection and start its heartbeat
//! - Receive loop: decode once, dispatch sequentially, enqueue replies
//! - Teardown: cancel + join heartbeat, deregister, stop the writer
//!
//! Phases: `Connecting -> [Authenticating] -> Active -> Closing -> Closed`.
//! A rejected handshake goes `Authenticating -> Closing` and never registers.

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::HeaderMap,
    response::Response,
};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use amonitor_core::error::Result;
use amonitor_core::protocol::encode;
use amonitor_core::{Envelope, GOING_AWAY_CLOSE_CODE, UNAUTHORIZED_CLOSE_CODE};

use crate::app_state::SdkState;
use crate::realtime::{run_heartbeat, ConnId, Connection, ConnectionRegistry, HeartbeatExit};
use crate::transport::codec::{decode, Inbound};

const OUTBOUND_QUEUE: usize = 1024;
const WRITER_DRAIN: Duration = Duration::from_secs(1);

type WsSink = SplitSink<WebSocket, Message>;
type WsSource = SplitStream<WebSocket>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}

fn advance(phase: &mut SessionPhase, next: SessionPhase) {
    let from = *phase;
    tracing::debug!(?from, to = ?next, "session phase");
    *phase = next;
}

fn close_message(code: u16, reason: &'static str) -> Message {
    Message::Close(Some(CloseFrame {
        code,
        reason: Cow::Borrowed(reason),
    }))
}

// --------------------
// Entry
// --------------------
pub async fn ws_upgrade(
    State(state): State<SdkState>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> Response {
    let verdict = state.auth().verify(&headers);
    let max = state.cfg().server.max_frame_bytes;

    ws.max_message_size(max)
        .max_frame_size(max)
        .on_upgrade(move |socket| async move {
            let conn_id = state.registry().next_id();
            let span = tracing::info_span!("session", conn_id, target_id = %state.target_id());
            run_session(state, socket, conn_id, verdict)
                .instrument(span)
                .await;
        })
}

// --------------------
// Lifecycle
// --------------------
async fn run_session(state: SdkState, socket: WebSocket, conn_id: ConnId, verdict: Result<()>) {
    let (mut ws_tx, ws_rx) = socket.split();
    let mut phase = SessionPhase::Connecting;

    if state.auth().required() {
        advance(&mut phase, SessionPhase::Authenticating);
        if let Err(e) = verdict {
            tracing::warn!(code = e.client_code().as_str(), "handshake rejected");
            advance(&mut phase, SessionPhase::Closing);
            let _ = ws_tx
                .send(close_message(UNAUTHORIZED_CLOSE_CODE, "unauthorized"))
                .await;
            let _ = ws_tx.close().await;
            advance(&mut phase, SessionPhase::Closed);
            return;
        }
    }

    let (mut session, out_tx) = Session::activate(&state, conn_id, ws_tx, phase);
    tracing::info!(connections = state.registry().len(), "controller attached");

    let cancel = session.cancel.clone();
    let reason = receive_loop(&state, ws_rx, &out_tx, &cancel).await;

    drop(out_tx);
    session.teardown().await;
    tracing::info!(reason, connections = state.registry().len(), "controller detached");
}

/// Live half of a connection: registry entry plus its two background tasks.
struct Session {
    conn_id: ConnId,
    phase: SessionPhase,
    registry: Arc<ConnectionRegistry>,
    /// Stops the receive loop and the writer. Child of the shutdown token.
    cancel: CancellationToken,
    heartbeat_cancel: CancellationToken,
    heartbeat: Option<JoinHandle<HeartbeatExit>>,
    writer: Option<JoinHandle<()>>,
}

impl Session {
    fn activate(
        state: &SdkState,
        conn_id: ConnId,
        ws_tx: WsSink,
        mut phase: SessionPhase,
    ) -> (Self, mpsc::Sender<Message>) {
        let (out_tx, out_rx) = mpsc::channel::<Message>(OUTBOUND_QUEUE);
        let cancel = state.shutdown_token().child_token();
        let heartbeat_cancel = cancel.child_token();

        let writer = tokio::spawn(
            run_writer(ws_tx, out_rx, cancel.clone(), state.shutdown_token().clone())
                .in_current_span(),
        );
        let heartbeat = tokio::spawn(
            run_heartbeat(
                out_tx.clone(),
                state.target_id(),
                state.cfg().target.heartbeat_interval(),
                heartbeat_cancel.clone(),
            )
            .in_current_span(),
        );

        let registry = state.registry();
        registry.insert(Connection {
            id: conn_id,
            tx: out_tx.clone(),
        });
        advance(&mut phase, SessionPhase::Active);

        let session = Self {
            conn_id,
            phase,
            registry,
            cancel,
            heartbeat_cancel,
            heartbeat: Some(heartbeat),
            writer: Some(writer),
        };
        (session, out_tx)
    }

    /// Cancel-then-join the heartbeat, deregister, then stop the writer.
    /// Safe to call more than once.
    async fn teardown(&mut self) {
        if matches!(self.phase, SessionPhase::Closing | SessionPhase::Closed) {
            return;
        }
        advance(&mut self.phase, SessionPhase::Closing);

        self.heartbeat_cancel.cancel();
        if let Some(hb) = self.heartbeat.take() {
            match hb.await {
                Ok(exit) => tracing::debug!(?exit, "heartbeat stopped"),
                Err(e) => tracing::warn!(error = %e, "heartbeat task failed"),
            }
        }
        self.registry.remove(self.conn_id);

        self.cancel.cancel();
        if let Some(mut writer) = self.writer.take() {
            if timeout(WRITER_DRAIN, &mut writer).await.is_err() {
                tracing::debug!("writer did not stop in time, aborting");
                writer.abort();
            }
        }
        advance(&mut self.phase, SessionPhase::Closed);
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        // Teardown was skipped or interrupted (task aborted mid-await).
        if self.phase != SessionPhase::Closed {
            self.heartbeat_cancel.cancel();
            self.cancel.cancel();
            self.registry.remove(self.conn_id);
        }
    }
}

// --------------------
// Receive loop
// --------------------
async fn receive_loop(
    state: &SdkState,
    mut ws_rx: WsSource,
    out_tx: &mpsc::Sender<Message>,
    cancel: &CancellationToken,
) -> &'static str {
    let target_id = state.target_id();
    // One frame read ahead while an action is in flight.
    let mut pending: Option<Message> = None;

    loop {
        let msg = match pending.take() {
            Some(m) => m,
            None => {
                let incoming = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return cancel_reason(state),
                    incoming = ws_rx.next() => incoming,
                };
                match incoming {
                    Some(Ok(m)) => m,
                    Some(Err(e)) => {
                        tracing::debug!(error = %e, "socket read failed");
                        return "transport error";
                    }
                    None => return "peer closed",
                }
            }
        };

        match decode(msg) {
            Ok(Inbound::Envelope(env)) => {
                // Keep watching the socket so a disconnect is seen while the
                // handler runs; the handler's result is then discarded.
                let dispatch = state.dispatcher().dispatch(&env);
                tokio::pin!(dispatch);
                let reply = loop {
                    tokio::select! {
                        biased;
                        () = cancel.cancelled() => return cancel_reason(state),
                        reply = &mut dispatch => break reply,
                        incoming = ws_rx.next(), if pending.is_none() => match incoming {
                            Some(Ok(Message::Close(_))) | None => {
                                tracing::debug!(
                                msg_id = %env.msg_id,
                                "peer left while action in flight"
                            );
                                return "peer closed";
                            }
                            Some(Err(e)) => {
                                tracing::debug!(
                                error = %e,
                                "socket read failed while action in flight"
                            );
                                return "transport error";
                            }
                            Some(Ok(m)) => pending = Some(m),
                        },
                    }
                };

                if let Some(reply) = reply {
                    if !enqueue(out_tx, &reply, cancel).await {
                        return "outbound queue closed";
                    }
                }
            }
            Ok(Inbound::Ping(payload)) => {
                if !enqueue_raw(out_tx, Message::Pong(payload), cancel).await {
                    return "outbound queue closed";
                }
            }
            Ok(Inbound::Pong) => {}
            Ok(Inbound::Close) => return "peer closed",
            Err(e) => {
                tracing::warn!(
                    code = e.client_code().as_str(),
                    error = %e,
                    "inbound frame rejected"
                );
                let reply = Envelope::error(&target_id, e.to_string());
                if !enqueue(out_tx, &reply, cancel).await {
                    return "outbound queue closed";
                }
            }
        }
    }
}

fn cancel_reason(state: &SdkState) -> &'static str {
    if state.shutdown_token().is_cancelled() {
        "shutdown"
    } else {
        "socket write failed"
    }
}

async fn enqueue(
    out_tx: &mpsc::Sender<Message>,
    env: &Envelope,
    cancel: &CancellationToken,
) -> bool {
    match encode(env) {
        Ok(text) => enqueue_raw(out_tx, Message::Text(text), cancel).await,
        Err(e) => {
            tracing::warn!(error = %e, "reply encode failed");
            true
        }
    }
}

async fn enqueue_raw(
    out_tx: &mpsc::Sender<Message>,
    msg: Message,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        () = cancel.cancelled() => false,
        r = out_tx.send(msg) => r.is_ok(),
    }
}

// --------------------
// Outbound writer
// --------------------
async fn run_writer(
    mut ws_tx: WsSink,
    mut out_rx: mpsc::Receiver<Message>,
    cancel: CancellationToken,
    shutdown: CancellationToken,
) {
    loop {
        let msg = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            m = out_rx.recv() => match m {
                Some(m) => m,
                None => break,
            },
        };
        let sent = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            r = ws_tx.send(msg) => r,
        };
        if let Err(e) = sent {
            tracing::debug!(error = %e, "socket write failed");
            cancel.cancel();
            return;
        }
    }

    if shutdown.is_cancelled() {
        let _ = ws_tx
            .send(close_message(GOING_AWAY_CLOSE_CODE, "shutting down"))
            .await;
    }
    let _ = ws_tx.close().await;
}
