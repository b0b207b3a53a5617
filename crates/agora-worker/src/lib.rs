//! # agora-worker
//!
//! Scheduled background work for Agora. Currently one job: publishing
//! the daily writing prompt to every connected client.

pub mod jobs;
pub mod scheduler;

pub use jobs::prompt::{PromptJob, PromptRun, PromptSource, RotatingPromptSource};
pub use scheduler::CronScheduler;
