//! Logs and metrics.
//!
//! ```text
//! logging.rs  → tracing subscriber (pretty locally, JSON in production)
//! metrics.rs  → Prometheus exporter + request / rate-limit / connection metrics
//! ```
//!
//! The executor and readiness gate record their own `db_*` metrics with the
//! `metrics` macros; nothing is exported until `init_metrics` runs.

pub mod logging;
pub mod metrics;
