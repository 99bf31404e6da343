//! Database client.
//!
//! # Responsibilities
//! - Own the connection state for one database server
//! - Establish the connection under the retry policy
//! - Probe the server for health checks and heartbeats
//! - Run caller operations behind the readiness gate
//!
//! The client does not pool connections or speak a query protocol; a probe
//! is a TCP connection to the server's address with a deadline.

use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use url::Url;

use crate::config::schema::DatabaseConfig;
use crate::db::error::{DatabaseError, DatabaseResult};
use crate::db::state::{ConnectionState, ConnectionStateSource, SharedConnectionState};
use crate::resilience::policy::RetryPolicy;
use crate::resilience::retries::{ExecutorError, RetryExecutor};

/// Port used when the URI does not name one.
pub const DEFAULT_PORT: u16 = 27017;

/// Snapshot of the connection, as reported by the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseStatus {
    pub ready_state: u8,
    pub status: ConnectionState,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub name: Option<String>,
}

impl DatabaseStatus {
    /// Status reported when the service runs without a database.
    pub fn unconfigured() -> Self {
        Self {
            ready_state: ConnectionState::Disconnected as u8,
            status: ConnectionState::Disconnected,
            host: None,
            port: None,
            name: None,
        }
    }
}

/// Handle to a single database server.
#[derive(Debug)]
pub struct DatabaseClient {
    host: String,
    port: u16,
    name: Option<String>,
    connect_timeout: Duration,
    state: Arc<SharedConnectionState>,
    executor: RetryExecutor,
}

impl DatabaseClient {
    /// Create a disconnected client for the configured URI.
    pub fn new(config: &DatabaseConfig, policy: RetryPolicy) -> DatabaseResult<Self> {
        let raw = config.uri.as_deref().ok_or(DatabaseError::NotConfigured)?;
        let uri = Url::parse(raw).map_err(|e| DatabaseError::InvalidUri(e.to_string()))?;
        let host = uri
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| DatabaseError::InvalidUri(format!("'{}' has no host", raw)))?
            .to_string();
        let name = Some(uri.path().trim_matches('/'))
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        Ok(Self {
            host,
            port: uri.port().unwrap_or(DEFAULT_PORT),
            name,
            connect_timeout: config.connect_timeout(),
            state: Arc::new(SharedConnectionState::default()),
            executor: RetryExecutor::new(policy).with_readiness_timeout(config.readiness_timeout()),
        })
    }

    /// Shared handle to the connection state, for readers elsewhere.
    pub fn state(&self) -> Arc<SharedConnectionState> {
        self.state.clone()
    }

    pub fn executor(&self) -> &RetryExecutor {
        &self.executor
    }

    pub(crate) fn set_state(&self, state: ConnectionState) -> ConnectionState {
        self.state.set(state)
    }

    /// Establish the connection, retrying transient failures.
    pub async fn connect(&self) -> Result<(), ExecutorError<DatabaseError>> {
        self.set_state(ConnectionState::Connecting);
        tracing::info!(host = %self.host, port = self.port, "Connecting to database");

        match self.executor.execute(|| self.ping()).await {
            Ok(()) => {
                self.set_state(ConnectionState::Connected);
                tracing::info!(host = %self.host, port = self.port, "Database connected");
                Ok(())
            }
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                tracing::error!(host = %self.host, port = self.port, error = %e, "Database connection failed");
                Err(e)
            }
        }
    }

    /// Probe the server once.
    pub async fn ping(&self) -> DatabaseResult<()> {
        let probe = TcpStream::connect((self.host.as_str(), self.port));
        match timeout(self.connect_timeout, probe).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(DatabaseError::Connection(e)),
            Err(_) => Err(DatabaseError::Timeout(self.connect_timeout.as_millis() as u64)),
        }
    }

    /// `true` only if the connection is up and the server answers a probe.
    pub async fn check_health(&self) -> bool {
        if self.connection_state() != ConnectionState::Connected {
            return false;
        }
        match self.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(error = %e, "Database health check failed");
                false
            }
        }
    }

    pub fn status(&self) -> DatabaseStatus {
        let state = self.connection_state();
        DatabaseStatus {
            ready_state: state as u8,
            status: state,
            host: Some(self.host.clone()),
            port: Some(self.port),
            name: self.name.clone(),
        }
    }

    /// Run `operation` once the connection is ready, under the retry policy.
    pub async fn run<T, F, Fut>(&self, operation: F) -> Result<T, ExecutorError<DatabaseError>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DatabaseResult<T>>,
    {
        self.executor.execute_with_readiness(self, operation).await
    }

    /// Mark the connection closed.
    pub fn close(&self) {
        self.set_state(ConnectionState::Disconnecting);
        self.set_state(ConnectionState::Disconnected);
        tracing::info!("Database connection closed through app termination");
    }
}

impl ConnectionStateSource for DatabaseClient {
    fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }
}
