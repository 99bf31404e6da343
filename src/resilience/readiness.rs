//! Readiness gate.
//!
//! Waits for a dependency connection to report `Connected` before any work
//! is attempted against it. Purely observational: the gate never touches the
//! connection itself.

use std::time::Duration;
use thiserror::Error;
use tokio::time::{sleep, Instant};

use crate::db::state::{ConnectionState, ConnectionStateSource};

/// Interval between two state checks.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default bound on how long the gate waits.
pub const DEFAULT_READINESS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    /// The connection was not ready within the allotted time.
    #[error("connection not ready after {elapsed:?} (last state: {last_state})")]
    Timeout {
        elapsed: Duration,
        last_state: &'static str,
    },
}

/// Block until `source` reports `Connected`, or fail after `limit`.
pub async fn wait_for_ready<S>(source: &S, limit: Duration) -> Result<(), ReadinessError>
where
    S: ConnectionStateSource + ?Sized,
{
    let start = Instant::now();

    loop {
        let state = source.connection_state();
        if state == ConnectionState::Connected {
            metrics::histogram!("db_readiness_wait_seconds").record(start.elapsed().as_secs_f64());
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= limit {
            tracing::warn!(elapsed = ?elapsed, state = state.as_str(), "Database connection not ready");
            return Err(ReadinessError::Timeout {
                elapsed,
                last_state: state.as_str(),
            });
        }

        sleep(POLL_INTERVAL.min(limit - elapsed)).await;
    }
}
