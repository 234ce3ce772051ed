//! Convenience result type alias for AuthCenter.

use crate::error::AppError;

/// A specialized `Result` type for AuthCenter operations.
pub type AppResult<T> = Result<T, AppError>;
