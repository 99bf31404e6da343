//! Database connection subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     client.rs connect() (retried probe)
//!     → state.rs: Disconnected → Connecting → Connected
//!     → heartbeat.rs starts periodic probes
//!
//! Caller operation:
//!     client.rs run()
//!     → resilience readiness gate (reads state.rs)
//!     → resilience retry executor
//!     → error.rs classifies failures
//! ```
//!
//! # Design Decisions
//! - The connection state is written only by the client and heartbeat
//! - Readers see the state through a read-only trait
//! - No pooling and no query language; operations are opaque closures

pub mod client;
pub mod error;
pub mod heartbeat;
pub mod state;

pub use client::{DatabaseClient, DatabaseStatus};
pub use error::{DatabaseError, DatabaseResult};
pub use heartbeat::Heartbeat;
pub use state::{ConnectionState, ConnectionStateSource, SharedConnectionState};
