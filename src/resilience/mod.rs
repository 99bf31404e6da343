//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation against the database:
//!     → readiness.rs (optional: wait for the connection to be usable)
//!     → retries.rs (attempt loop)
//!         → timeouts.rs (per-attempt deadline)
//!         → classify.rs (retryable or terminal?)
//!         → backoff.rs (exponential delay + jitter)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every attempt has a deadline
//! - Policies are validated once and immutable afterwards
//! - Request-side failures are never retried
//! - Jittered backoff prevents synchronized retry storms

pub mod backoff;
pub mod classify;
pub mod policy;
pub mod readiness;
pub mod retries;
pub mod timeouts;

pub use classify::{classify, Classification, Classify, FailureKind};
pub use policy::{PolicyError, RetryOptions, RetryPolicy};
pub use readiness::{wait_for_ready, ReadinessError};
pub use retries::{
    execute_with_readiness_and_retry, execute_with_retry, AttemptOutcome, ExecutorError,
    RetryExecutor,
};
