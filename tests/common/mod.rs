//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fmt;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use gas_price_api::config::{AppConfig, Environment};
use gas_price_api::resilience::{Classify, FailureKind, RetryPolicy};

/// Error type whose classification is chosen by the test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InjectedError(pub FailureKind);

impl fmt::Display for InjectedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "injected {} failure", self.0)
    }
}

impl std::error::Error for InjectedError {}

impl Classify for InjectedError {
    fn failure_kind(&self) -> FailureKind {
        self.0
    }
}

/// Counts invocations; fails with `kind` for the first `failures` calls.
#[derive(Clone)]
pub struct FlakyOperation {
    calls: Arc<AtomicU32>,
    failures: u32,
    kind: FailureKind,
}

impl FlakyOperation {
    pub fn new(failures: u32, kind: FailureKind) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures,
            kind,
        }
    }

    /// Never succeeds.
    pub fn always(kind: FailureKind) -> Self {
        Self::new(u32::MAX, kind)
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn invoke(&self) -> Result<u32, InjectedError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.failures {
            Err(InjectedError(self.kind))
        } else {
            Ok(call)
        }
    }
}

/// Policy with short delays so paused-clock tests stay readable.
pub fn quick_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_retries,
        Duration::from_millis(100),
        Duration::from_secs(2),
        Duration::from_millis(500),
    )
    .unwrap()
}

/// Accept and immediately drop TCP connections, standing in for a database server.
pub async fn start_fake_database() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            drop(socket);
        }
    });

    addr
}

/// A configuration that passes validation and never touches a real database.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.environment = Environment::Test;
    config.server.bind_address = "127.0.0.1:0".into();
    config
}
