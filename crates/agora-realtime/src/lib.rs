//! # agora-realtime
//!
//! Real-time engine for Agora. Provides:
//!
//! - A registry of live connections and the rooms they belong to, kept
//!   bidirectionally consistent under concurrent join/leave/disconnect
//! - An event router that validates inbound client events and resolves
//!   the audience of every outbound event
//! - A transport seam ([`transport::Transport`]) plus the bounded
//!   per-connection queues used by the WebSocket layer
//! - A bridge from domain events (new post, deleted post, new prompt)
//!   to global broadcasts

pub mod bridge;
pub mod connection;
pub mod error;
pub mod message;
pub mod metrics;
pub mod room;
pub mod router;
pub mod server;
pub mod transport;

pub use bridge::EventBridge;
pub use error::{DeliveryError, RealtimeError};
pub use room::registry::Registry;
pub use router::EventRouter;
pub use server::RealtimeEngine;
pub use transport::Transport;
