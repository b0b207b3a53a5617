//! Response DTOs.

use serde::{Deserialize, Serialize};

use agora_core::types::ConnectionId;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Server version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: i64,
    /// Registered realtime connections.
    pub connections: usize,
    /// Active rooms.
    pub rooms: usize,
}

/// Members of one room.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMembersResponse {
    /// Room name.
    pub room: String,
    /// Member connection IDs, sorted.
    pub members: Vec<ConnectionId>,
}
