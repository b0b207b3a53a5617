//! Route definitions for the Agora HTTP API.
//!
//! Monitoring and health routes are mounted under `/api`; the WebSocket
//! upgrade lives at `/ws`.

use axum::{Router, middleware as axum_middleware, routing::get};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::middleware::cors::build_cors_layer;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(realtime_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .route("/ws", get(handlers::ws::ws_upgrade))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(
            middleware::logging::request_logging,
        ))
        .with_state(state)
}

/// Registry monitoring endpoints
fn realtime_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/realtime/connections",
            get(handlers::realtime::list_connections),
        )
        .route("/realtime/rooms", get(handlers::realtime::list_rooms))
        .route(
            "/realtime/rooms/{room}/members",
            get(handlers::realtime::room_members),
        )
        .route("/realtime/metrics", get(handlers::realtime::metrics))
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
