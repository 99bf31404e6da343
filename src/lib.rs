//! Gas Price Predictor API library.
//!
//! HTTP scaffold around a resilient executor for database operations:
//! readiness gate, bounded retries with per-attempt timeouts, exponential
//! backoff with jitter, and a closed failure taxonomy.

pub mod config;
pub mod db;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod security;

pub use config::schema::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use resilience::{
    classify, execute_with_readiness_and_retry, execute_with_retry, ExecutorError, FailureKind,
    RetryExecutor, RetryOptions, RetryPolicy,
};
