use std::sync::atomic::{AtomicU64, Ordering};

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;

/// Per-process connection identifier.
pub type ConnId = u64;

/// One attached controller's outbound queue sender.
#[derive(Clone)]
pub struct Connection {
    pub id: ConnId,
    pub tx: mpsc::Sender<Message>,
}

/// Connection registry: `conn_id -> Connection` for every `Active` session.
///
/// Readers take a snapshot of cloned senders, so a broadcast never holds a
/// shard lock across an await and never observes a half-inserted entry.
pub struct ConnectionRegistry {
    conns: DashMap<ConnId, Connection>,
    seq: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            conns: DashMap::new(),
            seq: AtomicU64::new(1),
        }
    }

    /// Allocate an identifier for a connection that has not registered yet.
    pub fn next_id(&self) -> ConnId {
        self.seq.fetch_add(1, Ordering::Relaxed)
    }

    pub fn insert(&self, conn: Connection) {
        self.conns.insert(conn.id, conn);
    }

    /// Returns `true` only for the call that actually removed the entry.
    pub fn remove(&self, id: ConnId) -> bool {
        self.conns.remove(&id).is_some()
    }

    pub fn contains(&self, id: ConnId) -> bool {
        self.conns.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.conns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conns.is_empty()
    }

    pub fn snapshot(&self) -> Vec<Connection> {
        self.conns.iter().map(|e| e.value().clone()).collect()
    }
}
