//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (origin / preflight handling)
//!     → rate_limit.rs (check per-IP limits)
//!     → Pass to handlers
//!
//! Outgoing response:
//!     → headers.rs (browser security headers)
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Rejections use the same JSON envelope as every other error

pub mod cors;
pub mod headers;
pub mod rate_limit;

pub use cors::cors_layer;
pub use headers::security_headers;
pub use rate_limit::{rate_limit_middleware, RateLimiterState};
