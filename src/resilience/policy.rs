//! Retry policy.
//!
//! A `RetryPolicy` is immutable once built. Callers describe only the fields
//! they care about with `RetryOptions`; missing fields fall back to the
//! defaults below.

use std::time::Duration;
use thiserror::Error;

use crate::config::schema::RetryConfig;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(10);
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors raised while building a policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("max_retries must not be negative (got {0})")]
    NegativeRetries(i64),

    #[error("max_retries {0} is out of range")]
    RetriesOutOfRange(i64),

    #[error("base delay {base:?} exceeds max delay {max:?}")]
    BaseExceedsMax { base: Duration, max: Duration },

    #[error("per-attempt timeout must be greater than zero")]
    ZeroTimeout,
}

/// Partial policy. Unset fields take the defaults.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryOptions {
    pub max_retries: Option<i64>,
    pub base_delay: Option<Duration>,
    pub max_delay: Option<Duration>,
    pub timeout: Option<Duration>,
}

impl RetryOptions {
    pub fn max_retries(mut self, retries: i64) -> Self {
        self.max_retries = Some(retries);
        self
    }

    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = Some(delay);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Validated retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    base_delay: Duration,
    max_delay: Duration,
    per_attempt_timeout: Duration,
}

impl RetryPolicy {
    /// Build a policy, checking every invariant.
    pub fn new(
        max_retries: u32,
        base_delay: Duration,
        max_delay: Duration,
        per_attempt_timeout: Duration,
    ) -> Result<Self, PolicyError> {
        if base_delay > max_delay {
            return Err(PolicyError::BaseExceedsMax {
                base: base_delay,
                max: max_delay,
            });
        }
        if per_attempt_timeout.is_zero() {
            return Err(PolicyError::ZeroTimeout);
        }
        Ok(Self {
            max_retries,
            base_delay,
            max_delay,
            per_attempt_timeout,
        })
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    /// Upper bound on operation invocations.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    pub fn base_delay(&self) -> Duration {
        self.base_delay
    }

    pub fn max_delay(&self) -> Duration {
        self.max_delay
    }

    pub fn per_attempt_timeout(&self) -> Duration {
        self.per_attempt_timeout
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_BASE_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
            per_attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
        }
    }
}

impl TryFrom<RetryOptions> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(options: RetryOptions) -> Result<Self, Self::Error> {
        let max_retries = match options.max_retries {
            None => DEFAULT_MAX_RETRIES,
            Some(n) if n < 0 => return Err(PolicyError::NegativeRetries(n)),
            Some(n) => u32::try_from(n).map_err(|_| PolicyError::RetriesOutOfRange(n))?,
        };

        Self::new(
            max_retries,
            options.base_delay.unwrap_or(DEFAULT_BASE_DELAY),
            options.max_delay.unwrap_or(DEFAULT_MAX_DELAY),
            options.timeout.unwrap_or(DEFAULT_ATTEMPT_TIMEOUT),
        )
    }
}

impl TryFrom<&RetryConfig> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(config: &RetryConfig) -> Result<Self, Self::Error> {
        RetryPolicy::try_from(config.to_options())
    }
}
