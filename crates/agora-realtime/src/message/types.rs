//! Inbound and outbound WebSocket message type definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_core::events::PostSummary;
use agora_core::types::{ConnectionId, PostId};

use crate::error::RealtimeError;

/// Frames sent by the client to the server.
///
/// Room and payload are optional at the wire level so that a frame with a
/// missing field is reported as an invalid message rather than a parse
/// failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// Join a room, creating it if needed.
    JoinRoom {
        /// Room name.
        #[serde(default)]
        room: Option<String>,
    },
    /// Leave a room.
    LeaveRoom {
        /// Room name.
        #[serde(default)]
        room: Option<String>,
    },
    /// Send a message to the other members of a room.
    Message {
        /// Target room.
        #[serde(default)]
        room: Option<String>,
        /// Arbitrary JSON payload.
        #[serde(default)]
        message: Option<serde_json::Value>,
    },
}

/// Events pushed from the server to clients. This set is closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OutboundEvent {
    /// Another connection joined a room this connection is in.
    UserJoined {
        /// The joining connection.
        socket_id: ConnectionId,
        /// Room that was joined.
        room: String,
        /// When the join happened.
        timestamp: DateTime<Utc>,
    },
    /// Another connection left (or disconnected from) a room this connection is in.
    UserLeft {
        /// The departing connection.
        socket_id: ConnectionId,
        /// Room that was left.
        room: String,
        /// When the departure happened.
        timestamp: DateTime<Utc>,
    },
    /// A room message from another member.
    Message {
        /// The sending connection.
        socket_id: ConnectionId,
        /// Room the message was sent to.
        room: String,
        /// The payload as sent.
        message: serde_json::Value,
        /// When the message was accepted.
        timestamp: DateTime<Utc>,
    },
    /// A failed request by this connection.
    Error {
        /// Machine-readable code.
        code: String,
        /// Human-readable description.
        message: String,
        /// Room the failed request referred to, if any.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room: Option<String>,
    },
    /// A post was created.
    NewPost {
        /// Summary of the new post.
        post: PostSummary,
    },
    /// A post was deleted.
    PostDeleted {
        /// ID of the deleted post.
        post_id: PostId,
    },
    /// A new daily prompt is available.
    NewPrompt {
        /// The prompt topic.
        topic: String,
    },
}

impl OutboundEvent {
    /// Build a `userJoined` event stamped with the current time.
    pub fn user_joined(socket_id: ConnectionId, room: &str) -> Self {
        Self::UserJoined {
            socket_id,
            room: room.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Build a `userLeft` event stamped with the current time.
    pub fn user_left(socket_id: ConnectionId, room: &str) -> Self {
        Self::UserLeft {
            socket_id,
            room: room.to_string(),
            timestamp: Utc::now(),
        }
    }

    /// Build a room `message` event stamped with the current time.
    pub fn message(socket_id: ConnectionId, room: &str, message: serde_json::Value) -> Self {
        Self::Message {
            socket_id,
            room: room.to_string(),
            message,
            timestamp: Utc::now(),
        }
    }

    /// Build the `error` event reported to the originator of a failed request.
    pub fn error(err: &RealtimeError, room: Option<&str>) -> Self {
        Self::Error {
            code: err.code().to_string(),
            message: err.to_string(),
            room: room.map(str::to_string),
        }
    }

    /// Wire name of the event, as it appears in the `type` tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserJoined { .. } => "userJoined",
            Self::UserLeft { .. } => "userLeft",
            Self::Message { .. } => "message",
            Self::Error { .. } => "error",
            Self::NewPost { .. } => "newPost",
            Self::PostDeleted { .. } => "postDeleted",
            Self::NewPrompt { .. } => "newPrompt",
        }
    }
}
