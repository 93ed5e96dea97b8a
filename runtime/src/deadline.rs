//! Request deadlines for external provider calls.
//!
//! No booking operation is allowed to block indefinitely: every store read
//! and write is wrapped in a deadline and surfaces [`DeadlineError::Elapsed`]
//! instead of hanging the request.

use std::time::Duration;
use thiserror::Error;

/// Error produced when a provider call misses its deadline or fails.
#[derive(Debug, Error)]
pub enum DeadlineError<E> {
    /// The operation did not complete within the deadline.
    #[error("operation timed out after {0:?}")]
    Elapsed(Duration),

    /// The operation completed with an error before the deadline.
    #[error(transparent)]
    Inner(E),
}

impl<E> DeadlineError<E> {
    /// Returns `true` when the deadline elapsed (as opposed to the inner
    /// operation failing on its own).
    #[must_use]
    pub const fn is_elapsed(&self) -> bool {
        matches!(self, Self::Elapsed(_))
    }
}

/// Run a fallible async operation under a deadline.
///
/// # Errors
///
/// Returns [`DeadlineError::Elapsed`] if the deadline passes first, or
/// [`DeadlineError::Inner`] if the operation itself fails.
pub async fn with_deadline<F, T, E>(deadline: Duration, operation: F) -> Result<T, DeadlineError<E>>
where
    F: std::future::Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(DeadlineError::Inner(err)),
        Err(_) => {
            tracing::warn!(deadline_ms = deadline.as_millis(), "provider call missed deadline");
            Err(DeadlineError::Elapsed(deadline))
        },
    }
}
