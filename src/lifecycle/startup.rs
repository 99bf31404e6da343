//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Initialize logging and metrics
//! - Connect to the database according to the environment
//! - Start background tasks (heartbeat, signal listener)
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: configuration errors are fatal
//! - A database outage is fatal only in production
//! - Listeners start last (traffic only when ready)

use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::{self, AppConfig, ConfigError, Environment};
use crate::db::{DatabaseClient, DatabaseError, Heartbeat};
use crate::http::HttpServer;
use crate::lifecycle::shutdown::Shutdown;
use crate::lifecycle::signals::spawn_signal_listener;
use crate::observability::{logging, metrics};
use crate::resilience::policy::{PolicyError, RetryPolicy};
use crate::resilience::retries::ExecutorError;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("retry policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("cannot connect to database in production: {0}")]
    DatabaseUnavailable(#[from] ExecutorError<DatabaseError>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Load configuration, then run the service until a termination signal.
pub async fn run(config_path: Option<&Path>) -> Result<(), StartupError> {
    let config = config::load(config_path)?;
    logging::init(&config.observability, config.environment);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = config.environment.as_str(),
        bind_address = %config.server.bind_address,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    serve(Arc::new(config)).await
}

/// Run the service with an already validated configuration.
pub async fn serve(config: Arc<AppConfig>) -> Result<(), StartupError> {
    let shutdown = Arc::new(Shutdown::new());

    let database = connect_database(&config).await?;
    let heartbeat = database.as_ref().map(|db| {
        let heartbeat = Heartbeat::new(db.clone(), config.database.heartbeat_interval());
        tokio::spawn(heartbeat.run(shutdown.subscribe()))
    });

    let listener = TcpListener::bind(&config.server.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    spawn_signal_listener(shutdown.clone());

    let server = HttpServer::new(config.clone(), database.clone());
    let result = server.run(listener, shutdown.subscribe()).await;

    shutdown.trigger();
    if let Some(db) = database {
        close_database(&db, heartbeat).await;
    }

    result?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Wait for the heartbeat to exit, then close the client.
///
/// Shutdown must already be triggered. Joining first means no probe can
/// flip the state back to connected after the close.
pub async fn close_database(db: &DatabaseClient, heartbeat: Option<JoinHandle<()>>) {
    if let Some(handle) = heartbeat {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Database heartbeat task failed");
        }
    }
    db.close();
}

/// Create and connect the database client.
///
/// - `test` environment: no database
/// - no URI configured: log and run without a database
/// - connection failure: fatal in production, otherwise keep the client and
///   let the heartbeat pick the server up once it appears
pub async fn connect_database(config: &AppConfig) -> Result<Option<Arc<DatabaseClient>>, StartupError> {
    if config.environment == Environment::Test {
        tracing::debug!("Test environment, skipping database connection");
        return Ok(None);
    }

    if config.database.uri.is_none() {
        tracing::error!("Database connection string not found. Running without database.");
        return Ok(None);
    }

    let policy = RetryPolicy::try_from(&config.retries)?;
    let client = Arc::new(DatabaseClient::new(&config.database, policy)?);

    match client.connect().await {
        Ok(()) => {
            metrics::record_connection_up(true);
            Ok(Some(client))
        }
        Err(e) if config.environment.is_production() => {
            tracing::error!(error = %e, "Fatal: Cannot connect to database in production");
            Err(StartupError::DatabaseUnavailable(e))
        }
        Err(e) => {
            metrics::record_connection_up(false);
            tracing::warn!(error = %e, "Database connection optional - server will continue running");
            Ok(Some(client))
        }
    }
}
