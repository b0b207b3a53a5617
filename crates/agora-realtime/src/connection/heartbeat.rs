//! Ping/pong heartbeat for WebSocket keepalive.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time;

use agora_core::config::RealtimeConfig;

use crate::error::DeliveryError;

use super::handle::{ConnectionHandle, Frame};

/// Heartbeat configuration
#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Interval between pings
    pub ping_interval: Duration,
    /// Time without a pong before the connection is considered dead
    pub ping_timeout: Duration,
}

impl From<&RealtimeConfig> for HeartbeatConfig {
    fn from(config: &RealtimeConfig) -> Self {
        Self {
            ping_interval: Duration::from_secs(config.ping_interval_seconds.max(1)),
            ping_timeout: Duration::from_secs(config.ping_timeout_seconds.max(1)),
        }
    }
}

/// Run the heartbeat loop for a connection.
///
/// Sends periodic pings and returns once the connection should be torn
/// down: the pong deadline passed, the handle was closed, or the writer
/// is gone.
pub async fn run_heartbeat(handle: Arc<ConnectionHandle>, config: HeartbeatConfig) {
    let mut interval = time::interval(config.ping_interval);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;

        if !handle.is_alive() {
            break;
        }

        let elapsed = Utc::now() - handle.last_pong().await;
        if let Ok(elapsed_std) = elapsed.to_std() {
            if elapsed_std > config.ping_timeout {
                tracing::warn!(
                    conn_id = %handle.id,
                    elapsed_ms = elapsed_std.as_millis() as u64,
                    "Heartbeat timeout, closing connection"
                );
                handle.close();
                break;
            }
        }

        match handle.send(Frame::Ping) {
            Ok(()) => {}
            // A backed-up writer still counts as alive until the pong deadline.
            Err(DeliveryError::QueueFull(_)) => {
                tracing::debug!(conn_id = %handle.id, "Outbound queue full, skipping ping");
            }
            Err(e) => {
                tracing::debug!(conn_id = %handle.id, error = %e, "Ping send failed");
                break;
            }
        }
    }

    tracing::debug!(conn_id = %handle.id, "Heartbeat loop ended");
}
