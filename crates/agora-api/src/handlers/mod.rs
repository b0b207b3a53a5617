//! HTTP and WebSocket request handlers.

pub mod health;
pub mod realtime;
pub mod ws;
