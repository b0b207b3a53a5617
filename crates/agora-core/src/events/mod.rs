//! Domain events emitted by Agora's posting backend.
//!
//! Producers (post handlers, the prompt job) raise these after a domain
//! change has been committed. The real-time engine turns them into
//! broadcasts.

pub mod post;
pub mod prompt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use post::{PostEvent, PostSummary};
pub use prompt::PromptEvent;

/// Wrapper for all domain events with metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    /// Unique event ID.
    pub id: Uuid,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// The event payload.
    pub payload: EventPayload,
}

/// Union of all domain event types.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "domain", content = "event")]
pub enum EventPayload {
    /// A post-related event.
    Post(PostEvent),
    /// A prompt-related event.
    Prompt(PromptEvent),
}

impl DomainEvent {
    /// Create a new domain event.
    pub fn new(payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            payload,
        }
    }
}

impl From<PostEvent> for DomainEvent {
    fn from(event: PostEvent) -> Self {
        Self::new(EventPayload::Post(event))
    }
}

impl From<PromptEvent> for DomainEvent {
    fn from(event: PromptEvent) -> Self {
        Self::new(EventPayload::Prompt(event))
    }
}
