//! Realtime engine metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Engine-level metrics counters.
#[derive(Debug, Default)]
pub struct RealtimeMetrics {
    /// Total connections established
    connections_total: AtomicU64,
    /// Connections currently registered
    connections_active: AtomicU64,
    /// Inbound frames processed
    messages_received: AtomicU64,
    /// Events handed to a recipient's transport
    events_delivered: AtomicU64,
    /// Per-recipient delivery failures
    delivery_failures: AtomicU64,
    /// Successful room joins that changed membership
    joins_total: AtomicU64,
    /// Error events reported to originators
    errors_reported: AtomicU64,
}

impl RealtimeMetrics {
    /// Create new zeroed metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new connection
    pub fn connection_opened(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a disconnection
    pub fn connection_closed(&self) {
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    /// Record an inbound frame
    pub fn message_received(&self) {
        self.messages_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of one fan-out
    pub fn delivery(&self, delivered: usize, failed: usize) {
        self.events_delivered
            .fetch_add(delivered as u64, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(failed as u64, Ordering::Relaxed);
    }

    /// Record a join
    pub fn joined(&self) {
        self.joins_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an error event sent back to a client
    pub fn error_reported(&self) {
        self.errors_reported.fetch_add(1, Ordering::Relaxed);
    }

    /// Get a snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            events_delivered: self.events_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            joins_total: self.joins_total.load(Ordering::Relaxed),
            errors_reported: self.errors_reported.load(Ordering::Relaxed),
        }
    }
}

/// Serializable metrics snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    /// Total connections ever established
    pub connections_total: u64,
    /// Currently registered connections
    pub connections_active: u64,
    /// Inbound frames processed
    pub messages_received: u64,
    /// Events handed to a recipient's transport
    pub events_delivered: u64,
    /// Per-recipient delivery failures
    pub delivery_failures: u64,
    /// Room joins
    pub joins_total: u64,
    /// Error events reported to clients
    pub errors_reported: u64,
}
