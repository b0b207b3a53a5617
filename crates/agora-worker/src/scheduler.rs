//! Cron scheduler for periodic tasks.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use agora_core::config::PromptConfig;
use agora_core::error::AppError;
use agora_realtime::EventBridge;

use crate::jobs::prompt::{PromptJob, RotatingPromptSource};

/// Cron-based scheduler for periodic background tasks
pub struct CronScheduler {
    scheduler: JobScheduler,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {e}")))?;

        Ok(Self { scheduler })
    }

    /// Register every configured task
    pub async fn register_default_tasks(
        &self,
        prompts: &PromptConfig,
        bridge: Arc<EventBridge>,
    ) -> Result<(), AppError> {
        if prompts.enabled {
            let source = Arc::new(RotatingPromptSource::new(prompts.topics.clone())?);
            let job = Arc::new(PromptJob::new(source, bridge));
            self.register_prompt_job(job, &prompts.schedule).await?;
        } else {
            tracing::info!("Daily prompt job disabled");
        }
        Ok(())
    }

    /// Daily prompt: on `schedule`
    pub async fn register_prompt_job(
        &self,
        job: Arc<PromptJob>,
        schedule: &str,
    ) -> Result<(), AppError> {
        let cron = CronJob::new_async(schedule, move |_uuid, _lock| {
            let job = Arc::clone(&job);
            Box::pin(async move {
                if let Err(e) = job.run_today().await {
                    tracing::error!(error = %e, "Daily prompt job failed");
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid prompt schedule '{schedule}': {e}"))
        })?;

        self.scheduler
            .add(cron)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add prompt schedule: {e}")))?;

        tracing::info!(schedule = %schedule, "Registered: daily_prompt");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {e}")))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {e}")))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
