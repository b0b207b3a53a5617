//! Per-connection state owned by the registry.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_core::types::ConnectionId;

/// Registry-side state of one live connection.
///
/// Only the registry holds these; everything else sees [`ConnectionInfo`]
/// snapshots.
#[derive(Debug, Clone)]
pub struct ConnectionRecord {
    /// Connection identity.
    pub id: ConnectionId,
    /// When the connection was registered.
    pub connected_at: DateTime<Utc>,
    /// Rooms this connection has joined.
    pub rooms: HashSet<String>,
}

impl ConnectionRecord {
    /// Creates a record with no rooms.
    pub fn new(id: ConnectionId) -> Self {
        Self {
            id,
            connected_at: Utc::now(),
            rooms: HashSet::new(),
        }
    }

    /// Serializable snapshot with rooms in sorted order.
    pub fn info(&self) -> ConnectionInfo {
        let mut rooms: Vec<String> = self.rooms.iter().cloned().collect();
        rooms.sort();
        ConnectionInfo {
            id: self.id,
            connected_at: self.connected_at,
            rooms,
        }
    }
}

/// Snapshot of a connection record (serializable).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    /// Connection ID
    pub id: ConnectionId,
    /// Connected at
    pub connected_at: DateTime<Utc>,
    /// Joined rooms
    pub rooms: Vec<String>,
}
