//! Bridges domain events from the posting backend into broadcasts.

pub mod event_bridge;

pub use event_bridge::EventBridge;
