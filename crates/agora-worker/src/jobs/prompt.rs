//! Daily prompt job: picks a topic and announces it to every client.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Utc};
use tokio::sync::Mutex;

use agora_core::error::AppError;
use agora_realtime::EventBridge;

/// Where prompt topics come from.
#[async_trait]
pub trait PromptSource: Send + Sync + std::fmt::Debug {
    /// Topic for the given day.
    async fn next_topic(&self, date: NaiveDate) -> Result<String, AppError>;
}

/// Cycles through a fixed topic list, one per calendar day.
#[derive(Debug, Clone)]
pub struct RotatingPromptSource {
    topics: Vec<String>,
}

impl RotatingPromptSource {
    /// Fails if `topics` is empty.
    pub fn new(topics: Vec<String>) -> Result<Self, AppError> {
        if topics.is_empty() {
            return Err(AppError::configuration("prompts.topics must not be empty"));
        }
        Ok(Self { topics })
    }
}

#[async_trait]
impl PromptSource for RotatingPromptSource {
    async fn next_topic(&self, date: NaiveDate) -> Result<String, AppError> {
        let day = i64::from(date.num_days_from_ce());
        let index = day.rem_euclid(self.topics.len() as i64) as usize;
        Ok(self.topics[index].clone())
    }
}

/// Result of one job run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptRun {
    /// A new prompt went out.
    Published {
        /// The announced topic.
        topic: String,
        /// Connections that received it.
        delivered: usize,
    },
    /// Today's prompt was already out.
    AlreadyPublished,
}

/// Publishes at most one prompt per day.
#[derive(Debug)]
pub struct PromptJob {
    source: Arc<dyn PromptSource>,
    bridge: Arc<EventBridge>,
    /// Day of the last successful publish.
    last_published: Mutex<Option<NaiveDate>>,
}

impl PromptJob {
    /// Create a new prompt job
    pub fn new(source: Arc<dyn PromptSource>, bridge: Arc<EventBridge>) -> Self {
        Self {
            source,
            bridge,
            last_published: Mutex::new(None),
        }
    }

    /// Runs the job for the current UTC day.
    pub async fn run_today(&self) -> Result<PromptRun, AppError> {
        self.run(Utc::now().date_naive()).await
    }

    /// Runs the job for `today`.
    ///
    /// A failed source leaves the day unpublished so the next run retries.
    pub async fn run(&self, today: NaiveDate) -> Result<PromptRun, AppError> {
        let mut last = self.last_published.lock().await;
        if *last == Some(today) {
            tracing::info!(date = %today, "Prompt already published today, skipping");
            return Ok(PromptRun::AlreadyPublished);
        }

        let topic = self.source.next_topic(today).await?;
        let delivered = self.bridge.on_prompt_generated(&topic);
        *last = Some(today);

        tracing::info!(date = %today, topic = %topic, delivered, "Published daily prompt");
        Ok(PromptRun::Published { topic, delivered })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    use agora_core::config::RealtimeConfig;
    use agora_realtime::RealtimeEngine;
    use agora_realtime::connection::Frame;

    #[derive(Debug, Default)]
    struct FlakySource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PromptSource for FlakySource {
        async fn next_topic(&self, _date: NaiveDate) -> Result<String, AppError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::service_unavailable("generator offline"))
            } else {
                Ok("Second wind".to_string())
            }
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn rotating(topics: &[&str]) -> Arc<dyn PromptSource> {
        Arc::new(RotatingPromptSource::new(topics.iter().map(|t| t.to_string()).collect()).unwrap())
    }

    #[tokio::test]
    async fn test_publishes_once_per_day() {
        let engine = RealtimeEngine::new(&RealtimeConfig::default());
        let (_handle, mut rx) = engine.open_connection().unwrap();
        let job = PromptJob::new(rotating(&["A", "B"]), engine.bridge.clone());

        let first = job.run(day(1)).await.unwrap();
        assert!(matches!(first, PromptRun::Published { delivered: 1, .. }));
        assert_eq!(job.run(day(1)).await.unwrap(), PromptRun::AlreadyPublished);
        assert!(matches!(job.run(day(2)).await.unwrap(), PromptRun::Published { .. }));

        let mut prompts = 0;
        while let Ok(Frame::Text(text)) = rx.try_recv() {
            assert!(text.contains(r#""type":"newPrompt""#));
            prompts += 1;
        }
        assert_eq!(prompts, 2);
    }

    #[tokio::test]
    async fn test_failed_source_is_retried() {
        let engine = RealtimeEngine::new(&RealtimeConfig::default());
        let job = PromptJob::new(Arc::new(FlakySource::default()), engine.bridge.clone());

        assert!(job.run(day(5)).await.is_err());
        assert_eq!(
            job.run(day(5)).await.unwrap(),
            PromptRun::Published {
                topic: "Second wind".into(),
                delivered: 0
            }
        );
    }

    #[tokio::test]
    async fn test_rotation_moves_daily() {
        let source = rotating(&["A", "B", "C"]);
        let a = source.next_topic(day(1)).await.unwrap();
        let b = source.next_topic(day(2)).await.unwrap();
        let a_again = source.next_topic(day(4)).await.unwrap();

        assert_ne!(a, b);
        assert_eq!(a, a_again);
    }

    #[test]
    fn test_empty_topics_rejected() {
        assert!(RotatingPromptSource::new(Vec::new()).is_err());
    }
}
