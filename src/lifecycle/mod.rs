//! Process lifecycle.
//!
//! ```text
//! startup.rs   config → logging/metrics → database (per environment) → heartbeat → listener
//! signals.rs   SIGINT / SIGTERM → Shutdown::trigger
//! shutdown.rs  broadcast to server, heartbeat and retry sequences
//! ```
//!
//! On shutdown the server stops accepting and drains, then the database
//! client is closed.

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{run, serve, StartupError};
