//! Read-only views over the connection registry.

use axum::Json;
use axum::extract::{Path, State};

use agora_core::error::AppError;
use agora_realtime::connection::ConnectionInfo;
use agora_realtime::metrics::MetricsSnapshot;
use agora_realtime::room::RoomSummary;

use crate::dto::response::{ApiResponse, RoomMembersResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// GET /api/realtime/connections
pub async fn list_connections(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<ConnectionInfo>>> {
    Json(ApiResponse::ok(state.realtime.registry.connection_infos()))
}

/// GET /api/realtime/rooms
pub async fn list_rooms(State(state): State<AppState>) -> Json<ApiResponse<Vec<RoomSummary>>> {
    Json(ApiResponse::ok(state.realtime.registry.room_summaries()))
}

/// GET /api/realtime/rooms/{room}/members
///
/// Rooms only exist while they have members, so an empty room is a 404.
pub async fn room_members(
    State(state): State<AppState>,
    Path(room): Path<String>,
) -> Result<Json<ApiResponse<RoomMembersResponse>>, ApiError> {
    let mut members: Vec<_> = state.realtime.registry.members_of(&room).into_iter().collect();
    if members.is_empty() {
        return Err(AppError::not_found(format!("Room '{room}' has no members")).into());
    }
    members.sort();

    Ok(Json(ApiResponse::ok(RoomMembersResponse { room, members })))
}

/// GET /api/realtime/metrics
pub async fn metrics(State(state): State<AppState>) -> Json<ApiResponse<MetricsSnapshot>> {
    Json(ApiResponse::ok(state.realtime.metrics.snapshot()))
}
