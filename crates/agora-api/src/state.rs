//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use agora_core::config::AppConfig;
use agora_realtime::RealtimeEngine;

/// Shared application state passed to all Axum handlers via `State`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Real-time engine.
    pub realtime: Arc<RealtimeEngine>,
    /// When this process started serving.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Creates state over a running engine.
    pub fn new(config: Arc<AppConfig>, realtime: Arc<RealtimeEngine>) -> Self {
        Self {
            config,
            realtime,
            started_at: Utc::now(),
        }
    }
}
