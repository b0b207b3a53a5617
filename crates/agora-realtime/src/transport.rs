//! The seam between the router and whatever actually moves bytes.

use std::fmt;

use agora_core::types::ConnectionId;

use crate::error::DeliveryError;
use crate::message::types::OutboundEvent;

/// Outcome of delivering one event to a set of recipients.
#[derive(Debug, Default)]
pub struct FanOutReport {
    /// Number of recipients the event was handed to.
    pub delivered: usize,
    /// Recipients that could not be reached, with the reason.
    pub failed: Vec<(ConnectionId, DeliveryError)>,
}

/// Per-connection send primitive supplied by the transport adapter.
///
/// Implementations must not block: a send either enqueues the event or
/// fails immediately. Backpressure policy belongs to the implementation.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Deliver one event to one connection.
    fn send_to(&self, conn_id: ConnectionId, event: &OutboundEvent) -> Result<(), DeliveryError>;

    /// Deliver one event to each of `recipients`, continuing past failures.
    fn send_many(&self, recipients: &[ConnectionId], event: &OutboundEvent) -> FanOutReport {
        let mut report = FanOutReport::default();
        for conn_id in recipients {
            match self.send_to(*conn_id, event) {
                Ok(()) => report.delivered += 1,
                Err(e) => report.failed.push((*conn_id, e)),
            }
        }
        report
    }
}
