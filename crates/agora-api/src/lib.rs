//! # agora-api
//!
//! HTTP layer for Agora built on Axum.
//!
//! Hosts the `/ws` WebSocket upgrade that feeds the real-time engine,
//! read-only monitoring routes over the connection registry, health,
//! and the CORS/logging middleware stack.

pub mod app;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::ApiError;
pub use state::AppState;
