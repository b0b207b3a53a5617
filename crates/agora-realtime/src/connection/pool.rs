//! Connection pool: the transport adapter's table of open sockets.

use std::sync::Arc;

use dashmap::DashMap;

use agora_core::types::ConnectionId;

use crate::error::DeliveryError;
use crate::message::serializer::serialize_outbound;
use crate::message::types::OutboundEvent;
use crate::transport::{FanOutReport, Transport};

use super::handle::{ConnectionHandle, Frame};

/// Thread-safe pool of all open WebSocket connections.
///
/// This is transport state only; room membership lives in the registry.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    /// Connection ID → connection handle.
    by_id: DashMap<ConnectionId, Arc<ConnectionHandle>>,
}

impl ConnectionPool {
    /// Creates a new empty connection pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a connection to the pool.
    pub fn add(&self, handle: Arc<ConnectionHandle>) {
        self.by_id.insert(handle.id, handle);
    }

    /// Removes a connection from the pool.
    pub fn remove(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.remove(conn_id).map(|(_, handle)| handle)
    }

    /// Gets a specific connection by ID.
    pub fn get(&self, conn_id: &ConnectionId) -> Option<Arc<ConnectionHandle>> {
        self.by_id.get(conn_id).map(|entry| entry.value().clone())
    }

    /// Returns total number of open connections.
    pub fn connection_count(&self) -> usize {
        self.by_id.len()
    }

    /// Returns all connection handles.
    pub fn all_connections(&self) -> Vec<Arc<ConnectionHandle>> {
        self.by_id
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    fn deliver(&self, conn_id: ConnectionId, text: String) -> Result<(), DeliveryError> {
        match self.get(&conn_id) {
            Some(handle) => handle.send(Frame::Text(text)),
            None => Err(DeliveryError::NotConnected(conn_id)),
        }
    }
}

impl Transport for ConnectionPool {
    fn send_to(&self, conn_id: ConnectionId, event: &OutboundEvent) -> Result<(), DeliveryError> {
        let text =
            serialize_outbound(event).map_err(|e| DeliveryError::Serialization(e.to_string()))?;
        self.deliver(conn_id, text)
    }

    /// Encodes the event once and enqueues the same text for every recipient.
    fn send_many(&self, recipients: &[ConnectionId], event: &OutboundEvent) -> FanOutReport {
        let mut report = FanOutReport::default();
        let text = match serialize_outbound(event) {
            Ok(t) => t,
            Err(e) => {
                let err = DeliveryError::Serialization(e.to_string());
                report.failed = recipients.iter().map(|id| (*id, err.clone())).collect();
                return report;
            }
        };

        for conn_id in recipients {
            match self.deliver(*conn_id, text.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failed.push((*conn_id, e)),
            }
        }
        report
    }
}
