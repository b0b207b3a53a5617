//! Built-in job implementations.

pub mod prompt;

pub use prompt::PromptJob;
