//! Daily prompt job configuration.

use serde::{Deserialize, Serialize};

/// Settings for the scheduled job that publishes a new writing prompt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Whether the prompt job is scheduled at all.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Six-field cron expression (seconds first). Defaults to daily at midnight.
    #[serde(default = "default_schedule")]
    pub schedule: String,
    /// Topics the job rotates through.
    #[serde(default = "default_topics")]
    pub topics: Vec<String>,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            schedule: default_schedule(),
            topics: default_topics(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_schedule() -> String {
    "0 0 0 * * *".to_string()
}

fn default_topics() -> Vec<String> {
    [
        "Does technology make us more alone?",
        "Should voting be mandatory?",
        "Is social media a public square or a private business?",
        "Should homework be abolished?",
        "Does space exploration justify its cost?",
        "Is it ethical to eat meat?",
        "Should college be free?",
    ]
    .iter()
    .map(|t| t.to_string())
    .collect()
}
