//! Exponential backoff with jitter.

use std::time::Duration;
use rand::Rng;

/// Upper bound (exclusive) of the random jitter added to each delay.
pub const MAX_JITTER: Duration = Duration::from_millis(1000);

/// Calculate the delay before the attempt following `attempt` (0-based).
///
/// `min(base * 2^attempt + jitter, max)` with jitter uniform in `[0, 1000ms)`.
pub fn calculate_backoff(attempt: u32, base: Duration, max: Duration) -> Duration {
    let jitter_ms = rand::thread_rng().gen_range(0..MAX_JITTER.as_millis() as u64);
    backoff_with_jitter(attempt, base, max, Duration::from_millis(jitter_ms))
}

/// Deterministic core of [`calculate_backoff`].
pub fn backoff_with_jitter(attempt: u32, base: Duration, max: Duration, jitter: Duration) -> Duration {
    let factor = 2u32.checked_pow(attempt).unwrap_or(u32::MAX);
    base.checked_mul(factor)
        .and_then(|delay| delay.checked_add(jitter))
        .unwrap_or(Duration::MAX)
        .min(max)
}
