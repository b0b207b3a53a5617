//! Convenience result type alias for Agora.

use crate::error::AppError;

/// A specialized `Result` type for Agora operations.
pub type AppResult<T> = Result<T, AppError>;
