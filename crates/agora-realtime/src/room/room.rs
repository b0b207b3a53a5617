//! Single room with member tracking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use agora_core::types::ConnectionId;

/// A named broadcast scope and its current members.
///
/// Exists only while it has at least one member.
#[derive(Debug, Clone)]
pub struct Room {
    /// Room name.
    pub name: String,
    /// Member connection IDs.
    pub members: HashSet<ConnectionId>,
}

impl Room {
    /// Creates a new empty room.
    pub fn new(name: String) -> Self {
        Self {
            name,
            members: HashSet::new(),
        }
    }

    /// Adds a member. Returns `false` if it was already present.
    pub fn add(&mut self, conn_id: ConnectionId) -> bool {
        self.members.insert(conn_id)
    }

    /// Removes a member. Returns `false` if it was not present.
    pub fn remove(&mut self, conn_id: &ConnectionId) -> bool {
        self.members.remove(conn_id)
    }

    /// Returns member count.
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the room has any members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// Serializable room listing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    /// Room name
    pub name: String,
    /// Current member count
    pub member_count: usize,
}
