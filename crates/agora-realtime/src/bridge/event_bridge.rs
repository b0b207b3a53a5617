//! Domain event → broadcast mapping.
//!
//! Producers call these after the change is durable. Every domain event
//! goes to all connected clients regardless of room membership.

use std::sync::Arc;

use tracing::info;

use agora_core::events::{DomainEvent, EventPayload, PostEvent, PostSummary, PromptEvent};
use agora_core::types::PostId;

use crate::message::types::OutboundEvent;
use crate::router::EventRouter;

/// Bridges domain events into the realtime system.
#[derive(Debug, Clone)]
pub struct EventBridge {
    router: Arc<EventRouter>,
}

impl EventBridge {
    /// Create a new event bridge
    pub fn new(router: Arc<EventRouter>) -> Self {
        Self { router }
    }

    /// Handle a post created event
    pub fn on_post_created(&self, post: PostSummary) -> usize {
        let post_id = post.id;
        let delivered = self
            .router
            .broadcast_to_all(&OutboundEvent::NewPost { post });
        info!(post_id = %post_id, delivered, "Announced new post");
        delivered
    }

    /// Handle a post deleted event
    pub fn on_post_deleted(&self, post_id: PostId) -> usize {
        let delivered = self
            .router
            .broadcast_to_all(&OutboundEvent::PostDeleted { post_id });
        info!(post_id = %post_id, delivered, "Announced post deletion");
        delivered
    }

    /// Handle a newly generated prompt
    pub fn on_prompt_generated(&self, topic: &str) -> usize {
        let delivered = self.router.broadcast_to_all(&OutboundEvent::NewPrompt {
            topic: topic.to_string(),
        });
        info!(topic = %topic, delivered, "Announced new prompt");
        delivered
    }

    /// Route any domain event to the matching handler.
    pub fn dispatch(&self, event: &DomainEvent) -> usize {
        match &event.payload {
            EventPayload::Post(PostEvent::Created { post }) => self.on_post_created(post.clone()),
            EventPayload::Post(PostEvent::Deleted { post_id }) => self.on_post_deleted(*post_id),
            EventPayload::Prompt(PromptEvent::Generated { topic }) => {
                self.on_prompt_generated(topic)
            }
        }
    }
}
