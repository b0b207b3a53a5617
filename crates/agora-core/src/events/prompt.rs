//! Prompt-related domain events.

use serde::{Deserialize, Serialize};

/// Events related to the daily writing prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PromptEvent {
    /// A new prompt became available.
    Generated {
        /// The prompt topic.
        topic: String,
    },
}
