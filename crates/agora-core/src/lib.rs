//! # agora-core
//!
//! Core crate for Agora. Contains configuration schemas, typed
//! identifiers, domain events emitted by the posting backend,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other Agora crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
