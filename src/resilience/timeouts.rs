//! Timeout enforcement.
//!
//! # Responsibilities
//! - Race a single attempt against its deadline
//! - Keep timer expiry distinct from the operation's own errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - The losing operation future is dropped, which cancels it if it is cancellable

use std::fmt;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;

use crate::resilience::classify::{Classify, FailureKind};

/// Failure of one attempt.
#[derive(Debug)]
pub enum AttemptError<E> {
    /// The timer fired before the operation completed.
    TimedOut(Duration),
    /// The operation completed with an error.
    Failed(E),
}

impl<E: fmt::Display> fmt::Display for AttemptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptError::TimedOut(limit) => write!(f, "operation timeout after {:?}", limit),
            AttemptError::Failed(e) => e.fmt(f),
        }
    }
}

impl<E: Classify> Classify for AttemptError<E> {
    fn failure_kind(&self) -> FailureKind {
        match self {
            AttemptError::TimedOut(_) => FailureKind::Timeout,
            AttemptError::Failed(e) => e.failure_kind(),
        }
    }
}

/// Run `future` with a deadline of `limit`.
pub async fn run_with_timeout<T, E, F>(limit: Duration, future: F) -> Result<T, AttemptError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match timeout(limit, future).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(AttemptError::Failed(e)),
        Err(_) => Err(AttemptError::TimedOut(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resilience::classify::classify;

    #[tokio::test(start_paused = true)]
    async fn test_timer_wins() {
        let result: Result<(), AttemptError<FailureKind>> =
            run_with_timeout(Duration::from_millis(50), std::future::pending()).await;

        let err = result.unwrap_err();
        assert!(matches!(err, AttemptError::TimedOut(d) if d == Duration::from_millis(50)));
        assert_eq!(classify(&err).kind, FailureKind::Timeout);
        assert!(classify(&err).retryable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operation_wins() {
        let result = run_with_timeout(Duration::from_secs(1), async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Ok::<_, FailureKind>(7)
        })
        .await;
        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_operation_error_passes_through() {
        let result: Result<(), _> =
            run_with_timeout(Duration::from_secs(1), async { Err(FailureKind::NotFound) }).await;
        let err = result.unwrap_err();
        assert!(matches!(err, AttemptError::Failed(FailureKind::NotFound)));
        assert!(!classify(&err).retryable);
    }
}
