//! Connection state for the duplex transport.

use serde::{Deserialize, Serialize};

use std::fmt;

/// Lifecycle state of the assistant connection.
///
/// Owned exclusively by the connection manager; every other component only
/// observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connecting,
    Open,
    Closed,
    Reconnecting,
}

impl ConnectionState {
    /// Whether frames can be transmitted right now.
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Connecting => write!(f, "connecting"),
            ConnectionState::Open => write!(f, "open"),
            ConnectionState::Closed => write!(f, "closed"),
            ConnectionState::Reconnecting => write!(f, "reconnecting"),
        }
    }
}
