//! Connection state shared between the database client and its readers.
//!
//! # State Codes
//! ```text
//! 0 = disconnected, 1 = connected, 2 = connecting, 3 = disconnecting
//! ```
//!
//! Only the client writes the state; everything else reads it through
//! `ConnectionStateSource`.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use serde::Serialize;

/// Connection state of the database driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected = 0,
    Connected = 1,
    Connecting = 2,
    Disconnecting = 3,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == ConnectionState::Connected
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connected => "connected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Disconnecting => "disconnecting",
        }
    }
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Connected,
            2 => ConnectionState::Connecting,
            3 => ConnectionState::Disconnecting,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Read-only view of a connection's state.
pub trait ConnectionStateSource {
    fn connection_state(&self) -> ConnectionState;
}

impl<T: ConnectionStateSource + ?Sized> ConnectionStateSource for Arc<T> {
    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }
}

impl<T: ConnectionStateSource + ?Sized> ConnectionStateSource for &T {
    fn connection_state(&self) -> ConnectionState {
        (**self).connection_state()
    }
}

/// Atomic cell holding a `ConnectionState`.
#[derive(Debug)]
pub struct SharedConnectionState {
    state: AtomicU8,
}

impl SharedConnectionState {
    pub fn new(initial: ConnectionState) -> Self {
        Self {
            state: AtomicU8::new(initial as u8),
        }
    }

    /// Store a new state, returning the previous one.
    pub fn set(&self, state: ConnectionState) -> ConnectionState {
        ConnectionState::from(self.state.swap(state as u8, Ordering::AcqRel))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from(self.state.load(Ordering::Acquire))
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

impl ConnectionStateSource for SharedConnectionState {
    fn connection_state(&self) -> ConnectionState {
        self.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_codes() {
        assert_eq!(ConnectionState::from(0), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::from(1), ConnectionState::Connected);
        assert_eq!(ConnectionState::from(2), ConnectionState::Connecting);
        assert_eq!(ConnectionState::from(3), ConnectionState::Disconnecting);
        assert_eq!(ConnectionState::from(99), ConnectionState::Disconnected);
        assert_eq!(ConnectionState::Connected as u8, 1);
    }

    #[test]
    fn test_shared_state_swap() {
        let state = SharedConnectionState::default();
        assert_eq!(state.connection_state(), ConnectionState::Disconnected);

        let previous = state.set(ConnectionState::Connecting);
        assert_eq!(previous, ConnectionState::Disconnected);
        assert_eq!(state.get(), ConnectionState::Connecting);
    }

    #[test]
    fn test_serializes_lowercase() {
        let json = serde_json::to_string(&ConnectionState::Disconnecting).unwrap();
        assert_eq!(json, "\"disconnecting\"");
    }
}
