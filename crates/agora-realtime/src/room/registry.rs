//! Connection/room registry: the only mutator of membership state.
//!
//! Both directions of the membership relation (connection → rooms and
//! room → members) live behind one mutex, so every operation is a single
//! atomic step and no caller can observe the two maps disagreeing. The
//! critical sections are plain map operations; callers take snapshots
//! and do their I/O after the lock is released.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use agora_core::types::ConnectionId;

use crate::connection::record::{ConnectionInfo, ConnectionRecord};
use crate::error::RealtimeError;

use super::room::{Room, RoomSummary};

#[derive(Debug, Default)]
struct RegistryState {
    connections: HashMap<ConnectionId, ConnectionRecord>,
    rooms: HashMap<String, Room>,
}

impl RegistryState {
    /// Drops `conn_id` from `room`, deleting the room if it becomes empty.
    fn detach(&mut self, conn_id: &ConnectionId, room: &str) {
        if let Some(entry) = self.rooms.get_mut(room) {
            entry.remove(conn_id);
            if entry.is_empty() {
                self.rooms.remove(room);
            }
        }
    }
}

/// Process-wide table of live connections and room memberships.
#[derive(Debug, Default)]
pub struct Registry {
    state: Mutex<RegistryState>,
}

impl Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    // No mutation below calls out while holding the lock, so a poisoned
    // guard still protects consistent maps.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers a new connection with no rooms.
    pub fn register(&self, conn_id: ConnectionId) -> Result<(), RealtimeError> {
        let mut state = self.lock();
        if state.connections.contains_key(&conn_id) {
            return Err(RealtimeError::DuplicateIdentity(conn_id));
        }
        state
            .connections
            .insert(conn_id, ConnectionRecord::new(conn_id));
        Ok(())
    }

    /// Removes a connection and all of its memberships.
    ///
    /// Returns the removed record, or `None` if the connection was not
    /// registered (disconnects may race and must be idempotent).
    pub fn unregister(&self, conn_id: &ConnectionId) -> Option<ConnectionRecord> {
        let mut state = self.lock();
        let record = state.connections.remove(conn_id)?;
        for room in &record.rooms {
            state.detach(conn_id, room);
        }
        Some(record)
    }

    /// Adds a connection to a room, creating the room if needed.
    ///
    /// Returns `true` if membership changed, `false` if it was already a member.
    pub fn join(&self, conn_id: &ConnectionId, room: &str) -> Result<bool, RealtimeError> {
        let mut state = self.lock();
        let record = state
            .connections
            .get_mut(conn_id)
            .ok_or(RealtimeError::UnknownConnection(*conn_id))?;

        if !record.rooms.insert(room.to_string()) {
            return Ok(false);
        }

        state
            .rooms
            .entry(room.to_string())
            .or_insert_with(|| Room::new(room.to_string()))
            .add(*conn_id);
        Ok(true)
    }

    /// Removes a connection from a room, deleting the room if it becomes empty.
    ///
    /// Returns `true` if membership changed, `false` if it was not a member.
    pub fn leave(&self, conn_id: &ConnectionId, room: &str) -> Result<bool, RealtimeError> {
        let mut state = self.lock();
        let record = state
            .connections
            .get_mut(conn_id)
            .ok_or(RealtimeError::UnknownConnection(*conn_id))?;

        if !record.rooms.remove(room) {
            return Ok(false);
        }

        state.detach(conn_id, room);
        Ok(true)
    }

    /// Snapshot of a room's members; empty if the room does not exist.
    pub fn members_of(&self, room: &str) -> HashSet<ConnectionId> {
        self.lock()
            .rooms
            .get(room)
            .map(|r| r.members.clone())
            .unwrap_or_default()
    }

    /// Snapshot of the rooms a connection has joined.
    pub fn rooms_of(&self, conn_id: &ConnectionId) -> Result<HashSet<String>, RealtimeError> {
        self.lock()
            .connections
            .get(conn_id)
            .map(|record| record.rooms.clone())
            .ok_or(RealtimeError::UnknownConnection(*conn_id))
    }

    /// Whether a connection is currently registered.
    pub fn is_registered(&self, conn_id: &ConnectionId) -> bool {
        self.lock().connections.contains_key(conn_id)
    }

    /// All registered connection IDs, sorted.
    pub fn connected(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.lock().connections.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Names of all rooms with at least one member, sorted.
    pub fn active_rooms(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().rooms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Snapshot of one connection's record.
    pub fn connection_info(&self, conn_id: &ConnectionId) -> Option<ConnectionInfo> {
        self.lock().connections.get(conn_id).map(|r| r.info())
    }

    /// Snapshots of every registered connection, sorted by ID.
    pub fn connection_infos(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> =
            self.lock().connections.values().map(|r| r.info()).collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Every active room with its member count, sorted by name.
    pub fn room_summaries(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<RoomSummary> = self
            .lock()
            .rooms
            .values()
            .map(|room| RoomSummary {
                name: room.name.clone(),
                member_count: room.member_count(),
            })
            .collect();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        rooms
    }

    /// Number of registered connections.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.lock().rooms.len()
    }

    /// Checks that both sides of the membership relation agree and that
    /// no empty room is retained.
    pub fn is_consistent(&self) -> bool {
        let state = self.lock();

        let forward = state.connections.values().all(|record| {
            record.rooms.iter().all(|name| {
                state
                    .rooms
                    .get(name)
                    .is_some_and(|room| room.members.contains(&record.id))
            })
        });

        let backward = state.rooms.iter().all(|(name, room)| {
            !room.is_empty()
                && room.name == *name
                && room.members.iter().all(|id| {
                    state
                        .connections
                        .get(id)
                        .is_some_and(|record| record.rooms.contains(name))
                })
        });

        forward && backward
    }
}
