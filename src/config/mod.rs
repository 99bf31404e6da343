//! Service configuration.
//!
//! ```text
//! optional TOML file ──▶ AppConfig defaults filled by serde
//!                      ──▶ APP_ENV / PORT / DATABASE_URI / ... overrides
//!                      ──▶ validate_config (every violation reported)
//!                      ──▶ Arc<AppConfig> handed to startup
//! ```
//!
//! There is no global instance and no hot reload: the configuration is built
//! once in `lifecycle::startup` and passed down explicitly.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load, load_config, ConfigError};
pub use schema::AppConfig;
pub use schema::DatabaseConfig;
pub use schema::Environment;
pub use schema::RetryConfig;
pub use schema::ServerConfig;
