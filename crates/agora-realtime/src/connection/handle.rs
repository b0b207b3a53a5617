//! Transport-side handle to a single WebSocket connection.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use agora_core::types::ConnectionId;

use crate::error::DeliveryError;

/// A frame queued for the socket writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// An encoded outbound event.
    Text(String),
    /// A keepalive ping.
    Ping,
    /// Close the socket.
    Close,
}

/// A handle to a single WebSocket connection.
///
/// Holds the bounded queue feeding the socket writer task, plus liveness
/// bookkeeping for the heartbeat.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Unique connection ID
    pub id: ConnectionId,
    /// Sender for outbound frames
    sender: mpsc::Sender<Frame>,
    /// When the connection was established
    pub connected_at: DateTime<Utc>,
    /// Last pong received
    last_pong: tokio::sync::RwLock<DateTime<Utc>>,
    /// Whether the connection is still alive
    alive: AtomicBool,
}

impl ConnectionHandle {
    /// Create a new connection handle with a fresh identity.
    pub fn new(sender: mpsc::Sender<Frame>) -> Self {
        let now = Utc::now();
        Self {
            id: ConnectionId::new(),
            sender,
            connected_at: now,
            last_pong: tokio::sync::RwLock::new(now),
            alive: AtomicBool::new(true),
        }
    }

    /// Enqueue a frame without waiting.
    pub fn send(&self, frame: Frame) -> Result<(), DeliveryError> {
        if !self.is_alive() {
            return Err(DeliveryError::Closed(self.id));
        }
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(_)) => Err(DeliveryError::QueueFull(self.id)),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.mark_dead();
                Err(DeliveryError::Closed(self.id))
            }
        }
    }

    /// Queue a close frame and stop accepting further frames.
    pub fn close(&self) {
        if self.alive.swap(false, Ordering::SeqCst) {
            let _ = self.sender.try_send(Frame::Close);
        }
    }

    /// Check if connection is alive
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::SeqCst)
    }

    /// Mark connection as dead
    pub fn mark_dead(&self) {
        self.alive.store(false, Ordering::SeqCst);
    }

    /// Record a pong response
    pub async fn record_pong(&self) {
        let mut lp = self.last_pong.write().await;
        *lp = Utc::now();
    }

    /// Time of the last pong (or of connect, if none yet).
    pub async fn last_pong(&self) -> DateTime<Utc> {
        *self.last_pong.read().await
    }
}
