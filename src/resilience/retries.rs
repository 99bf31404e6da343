//! Retry executor.
//!
//! # Responsibilities
//! - Run an operation under a `RetryPolicy`
//! - Race each attempt against the per-attempt timeout
//! - Stop on success, on a terminal failure, or when the budget is spent
//! - Back off exponentially with jitter between attempts
//!
//! # Attempt Loop
//! ```text
//! attempt 0..=max_retries:
//!     run_with_timeout(operation())
//!     → Ok: return
//!     → Err: classify
//!         terminal            → Terminal
//!         last attempt        → RetriesExhausted / OperationTimeout
//!         otherwise           → sleep(backoff(attempt)), next attempt
//! ```
//!
//! Attempts of one invocation never overlap. Separate invocations keep
//! separate budgets and do not coordinate.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{sleep, Instant};

use crate::db::state::ConnectionStateSource;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::classify::{classify, Classification, Classify, FailureKind};
use crate::resilience::policy::{PolicyError, RetryOptions, RetryPolicy};
use crate::resilience::readiness::{wait_for_ready, ReadinessError, DEFAULT_READINESS_TIMEOUT};
use crate::resilience::timeouts::{run_with_timeout, AttemptError};

/// Final failure of an executor invocation.
#[derive(Debug, Error)]
pub enum ExecutorError<E> {
    #[error("invalid retry policy: {0}")]
    InvalidPolicy(#[from] PolicyError),

    #[error(transparent)]
    ReadinessTimeout(#[from] ReadinessError),

    /// The last allowed attempt hit its deadline.
    #[error("last of {attempts} attempt(s) timed out after {timeout:?}")]
    OperationTimeout { attempts: u32, timeout: Duration },

    /// A non-retryable failure ended the sequence early.
    #[error("operation failed with non-retryable {kind} error: {source}")]
    Terminal {
        kind: FailureKind,
        #[source]
        source: E,
    },

    #[error("operation failed after {attempts} attempt(s), last error ({kind}): {source}")]
    RetriesExhausted {
        kind: FailureKind,
        attempts: u32,
        #[source]
        source: E,
    },

    /// Shutdown was signalled before the sequence finished.
    #[error("operation cancelled by shutdown")]
    Cancelled,
}

impl<E> ExecutorError<E> {
    /// Failure kind of the attempt that ended the sequence, if any attempt ran.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            ExecutorError::OperationTimeout { .. } => Some(FailureKind::Timeout),
            ExecutorError::Terminal { kind, .. } | ExecutorError::RetriesExhausted { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    /// The operation's own error, when the sequence ended on one.
    pub fn into_source(self) -> Option<E> {
        match self {
            ExecutorError::Terminal { source, .. } | ExecutorError::RetriesExhausted { source, .. } => {
                Some(source)
            }
            _ => None,
        }
    }
}

/// Outcome of a single attempt, handed to logging, metrics and observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptOutcome {
    pub attempt_index: u32,
    pub succeeded: bool,
    pub failure: Option<FailureKind>,
    pub elapsed: Duration,
    /// Backoff scheduled after this attempt, if another one follows.
    pub delay: Option<Duration>,
}

type Observer = Arc<dyn Fn(&AttemptOutcome) + Send + Sync>;

/// Runs operations under a fixed retry policy.
#[derive(Clone)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    readiness_timeout: Duration,
    observer: Option<Observer>,
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("policy", &self.policy)
            .field("readiness_timeout", &self.readiness_timeout)
            .field("observer", &self.observer.as_ref().map(|_| "<observer>"))
            .finish()
    }
}

impl Default for RetryExecutor {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            readiness_timeout: DEFAULT_READINESS_TIMEOUT,
            observer: None,
        }
    }

    /// Override how long `execute_with_readiness` waits for the connection.
    pub fn with_readiness_timeout(mut self, timeout: Duration) -> Self {
        self.readiness_timeout = timeout;
        self
    }

    /// Register a callback invoked after every attempt.
    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&AttemptOutcome) + Send + Sync + 'static,
    {
        self.observer = Some(Arc::new(observer));
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds, fails terminally, or the budget is spent.
    pub async fn execute<T, E, F, Fut>(&self, mut operation: F) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        let timeout = self.policy.per_attempt_timeout();
        let mut attempt: u32 = 0;

        loop {
            let started = Instant::now();
            let result = run_with_timeout(timeout, operation()).await;
            let elapsed = started.elapsed();

            let err = match result {
                Ok(value) => {
                    self.report(AttemptOutcome {
                        attempt_index: attempt,
                        succeeded: true,
                        failure: None,
                        elapsed,
                        delay: None,
                    });
                    return Ok(value);
                }
                Err(err) => err,
            };

            let Classification { kind, retryable } = classify(&err);
            let attempts = attempt.saturating_add(1);

            if !retryable || attempt >= self.policy.max_retries() {
                self.report(AttemptOutcome {
                    attempt_index: attempt,
                    succeeded: false,
                    failure: Some(kind),
                    elapsed,
                    delay: None,
                });
                tracing::warn!(
                    attempt = attempts,
                    kind = kind.as_str(),
                    retryable,
                    error = %err,
                    "Database operation failed, giving up"
                );
                return Err(finalize(err, kind, attempts, retryable));
            }

            let delay = calculate_backoff(attempt, self.policy.base_delay(), self.policy.max_delay());
            self.report(AttemptOutcome {
                attempt_index: attempt,
                succeeded: false,
                failure: Some(kind),
                elapsed,
                delay: Some(delay),
            });
            tracing::warn!(
                attempt = attempts,
                delay_ms = delay.as_millis() as u64,
                kind = kind.as_str(),
                error = %err,
                "Database operation attempt failed, retrying"
            );
            metrics::counter!("db_operation_retries_total").increment(1);

            sleep(delay).await;
            attempt += 1;
        }
    }

    /// Wait for `source` to be connected, then run `operation` under the policy.
    ///
    /// A readiness failure consumes no retry budget and never invokes the operation.
    pub async fn execute_with_readiness<S, T, E, F, Fut>(
        &self,
        source: &S,
        operation: F,
    ) -> Result<T, ExecutorError<E>>
    where
        S: ConnectionStateSource + ?Sized,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        wait_for_ready(source, self.readiness_timeout).await?;
        self.execute(operation).await
    }

    /// Like [`execute`](Self::execute), but abandons the sequence on shutdown.
    ///
    /// The in-flight attempt or backoff sleep is dropped as soon as the signal arrives.
    pub async fn execute_until_shutdown<T, E, F, Fut>(
        &self,
        operation: F,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> Result<T, ExecutorError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Classify + fmt::Display,
    {
        tokio::select! {
            result = self.execute(operation) => result,
            _ = shutdown.recv() => {
                tracing::info!("Retry sequence cancelled by shutdown");
                Err(ExecutorError::Cancelled)
            }
        }
    }

    fn report(&self, outcome: AttemptOutcome) {
        let label = match outcome.failure {
            None => "success",
            Some(kind) => kind.as_str(),
        };
        metrics::counter!("db_operation_attempts_total", "outcome" => label).increment(1);

        if let Some(observer) = &self.observer {
            observer(&outcome);
        }
    }
}

fn finalize<E>(err: AttemptError<E>, kind: FailureKind, attempts: u32, retryable: bool) -> ExecutorError<E> {
    match err {
        AttemptError::TimedOut(timeout) => ExecutorError::OperationTimeout { attempts, timeout },
        AttemptError::Failed(source) if retryable => ExecutorError::RetriesExhausted {
            kind,
            attempts,
            source,
        },
        AttemptError::Failed(source) => ExecutorError::Terminal { kind, source },
    }
}

/// Run `operation` under `options` merged over the default policy.
pub async fn execute_with_retry<T, E, F, Fut>(
    operation: F,
    options: RetryOptions,
) -> Result<T, ExecutorError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    let policy = RetryPolicy::try_from(options)?;
    RetryExecutor::new(policy).execute(operation).await
}

/// Wait (up to the default readiness timeout) for `source`, then behave like
/// [`execute_with_retry`].
pub async fn execute_with_readiness_and_retry<S, T, E, F, Fut>(
    source: &S,
    operation: F,
    options: RetryOptions,
) -> Result<T, ExecutorError<E>>
where
    S: ConnectionStateSource + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + fmt::Display,
{
    let policy = RetryPolicy::try_from(options)?;
    RetryExecutor::new(policy)
        .execute_with_readiness(source, operation)
        .await
}
