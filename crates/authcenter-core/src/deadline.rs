//! Deadline enforcement for persistence-facing calls.

use std::future::Future;
use std::time::Duration;

use crate::error::AppError;
use crate::result::AppResult;

/// Runs `fut` with a fixed deadline.
///
/// An elapsed deadline becomes [`ErrorKind::Timeout`](crate::error::ErrorKind::Timeout)
/// naming `operation`, so callers can tell it apart from business rejections.
pub async fn with_deadline<T, F>(deadline: Duration, operation: &str, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::error!(
                operation = %operation,
                deadline_ms = deadline.as_millis() as u64,
                "Persistence call timed out"
            );
            Err(AppError::timeout(format!(
                "{operation} timed out after {}ms",
                deadline.as_millis()
            )))
        }
    }
}
