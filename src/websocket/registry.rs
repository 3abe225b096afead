//! Live WebSocket connections.
//!
//! A connection is OPEN while it is registered and CLOSED once it has been
//! unregistered; there is no way back. The socket itself is owned by its
//! writer task, and the registry only holds the sending half of that task's
//! channel.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::observability::metrics;

/// Frames the writer task can be asked to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Text(String),
    Close,
}

/// Result of pushing to a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Gone,
}

/// What is known about a connection besides its socket.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub connected_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub source_ip: String,
    pub user_agent: String,
}

impl ConnectionInfo {
    pub fn new(source_ip: String, user_agent: String) -> Self {
        let now = Utc::now();
        Self {
            connected_at: now,
            last_active_at: now,
            source_ip,
            user_agent,
        }
    }
}

struct ConnectionHandle {
    tx: mpsc::UnboundedSender<Outbound>,
    info: ConnectionInfo,
}

/// Table of open connections keyed by connection id.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<String, ConnectionHandle>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new connection under a fresh id and return the id.
    pub fn open(&self, tx: mpsc::UnboundedSender<Outbound>, info: ConnectionInfo) -> String {
        let connection_id = uuid::Uuid::new_v4().to_string();
        self.register(&connection_id, tx, info);
        connection_id
    }

    pub fn register(&self, connection_id: &str, tx: mpsc::UnboundedSender<Outbound>, info: ConnectionInfo) {
        self.connections
            .insert(connection_id.to_string(), ConnectionHandle { tx, info });
        metrics::record_ws_connections(self.connections.len());
        tracing::debug!(connection_id = %connection_id, "Connection registered");
    }

    /// Remove a connection. Returns its info if it was open.
    pub fn unregister(&self, connection_id: &str) -> Option<ConnectionInfo> {
        let removed = self.connections.remove(connection_id).map(|(_, handle)| handle.info);
        if removed.is_some() {
            metrics::record_ws_connections(self.connections.len());
            tracing::debug!(connection_id = %connection_id, "Connection unregistered");
        }
        removed
    }

    /// Push a text frame. Unknown, closed or dying connections are `Gone`.
    pub fn send(&self, connection_id: &str, data: impl Into<String>) -> Delivery {
        self.push(connection_id, Outbound::Text(data.into()))
    }

    /// Ask the writer to close the socket. The read side then unregisters it.
    pub fn close(&self, connection_id: &str) -> Delivery {
        self.push(connection_id, Outbound::Close)
    }

    pub fn info(&self, connection_id: &str) -> Option<ConnectionInfo> {
        self.connections
            .get(connection_id)
            .map(|handle| handle.info.clone())
    }

    /// Record client activity on a connection.
    pub fn touch(&self, connection_id: &str) {
        if let Some(mut handle) = self.connections.get_mut(connection_id) {
            handle.info.last_active_at = Utc::now();
        }
    }

    pub fn is_open(&self, connection_id: &str) -> bool {
        self.connections.contains_key(connection_id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    fn push(&self, connection_id: &str, frame: Outbound) -> Delivery {
        let Some(handle) = self.connections.get(connection_id) else {
            return Delivery::Gone;
        };
        match handle.tx.send(frame) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Gone,
        }
    }
}
