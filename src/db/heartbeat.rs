//! Connection heartbeat.
//!
//! # Responsibilities
//! - Periodically probe the database server
//! - Flip the connection state when the server drops out or comes back
//!
//! # State Transitions
//! ```text
//! Connected    → Disconnected: probe fails
//! Disconnected → Connected:    probe succeeds
//! Connecting / Disconnecting:  left alone (owned by connect/close)
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time;

use crate::db::client::DatabaseClient;
use crate::db::state::{ConnectionState, ConnectionStateSource};
use crate::observability::metrics;

pub struct Heartbeat {
    client: Arc<DatabaseClient>,
    interval: Duration,
}

impl Heartbeat {
    pub fn new(client: Arc<DatabaseClient>, interval: Duration) -> Self {
        Self { client, interval }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval = ?self.interval, "Database heartbeat starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        // The first tick completes immediately; connect() has just probed.
        ticker.tick().await;

        loop {
            // The probe is part of the raced future so shutdown also cuts an in-flight ping.
            let stopped = tokio::select! {
                _ = async {
                    ticker.tick().await;
                    self.beat().await;
                } => false,
                _ = shutdown.recv() => true,
            };

            if stopped {
                tracing::info!("Database heartbeat received shutdown signal, exiting loop");
                break;
            }
        }
    }

    async fn beat(&self) -> ConnectionState {
        let state = self.client.connection_state();
        let probe = self.client.ping().await;

        match (state, probe) {
            (ConnectionState::Connected, Err(e)) => {
                tracing::warn!(error = %e, "Database disconnected");
                self.client.set_state(ConnectionState::Disconnected);
                metrics::record_connection_up(false);
                ConnectionState::Disconnected
            }
            (ConnectionState::Disconnected, Ok(())) => {
                tracing::info!("Database reconnected");
                self.client.set_state(ConnectionState::Connected);
                metrics::record_connection_up(true);
                ConnectionState::Connected
            }
            (current, _) => current,
        }
    }
}
