//! Post-related domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::id::{PostId, UserId};

/// Summary of a newly created post, as pushed to connected clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostSummary {
    /// The post ID.
    pub id: PostId,
    /// The author.
    pub user_id: UserId,
    /// The author's display name.
    pub username: String,
    /// Post title.
    pub title: String,
    /// Post body.
    pub content: String,
    /// Kind of post (e.g. "essay", "response").
    pub post_type: String,
    /// Topic of the prompt this post answers, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Events related to post operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PostEvent {
    /// A post was created.
    Created {
        /// The created post.
        post: PostSummary,
    },
    /// A post was deleted.
    Deleted {
        /// The deleted post's ID.
        post_id: PostId,
    },
}
