//! Error taxonomy for the engine.
//!
//! Nothing in this taxonomy is fatal to the process: every variant maps to
//! a retried operation or a locally recovered, observable state change.

use thiserror::Error;

/// Errors from session persistence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage io error: {0}")]
    Io(String),

    #[error("registry encode/decode error: {0}")]
    Serde(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serde(e.to_string())
    }
}

/// Errors from the duplex transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    ConnectFailed(String),

    #[error("send failed: {0}")]
    SendFailed(String),

    #[error("connection closed{}", reason_suffix(.code, .reason))]
    Closed { code: Option<u16>, reason: String },
}

fn reason_suffix(code: &Option<u16>, reason: &str) -> String {
    match (code, reason.is_empty()) {
        (Some(c), true) => format!(" (code {c})"),
        (Some(c), false) => format!(" (code {c}: {reason})"),
        (None, true) => String::new(),
        (None, false) => format!(" ({reason})"),
    }
}

/// Local validation signals from the session controller.
///
/// These are checked signals, not faults: callers inspect them and move on.
/// None of them appends a message or mutates any state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The input was empty after trimming.
    #[error("empty input")]
    EmptyInput,

    /// A message is already in flight for this session.
    #[error("a message is already in flight")]
    Busy,

    /// The requested session does not exist in the registry.
    #[error("session not found")]
    SessionNotFound,
}

/// Errors from the reminder endpoints.
#[derive(Debug, Error)]
pub enum ReminderError {
    #[error("reminder request failed: {0}")]
    Http(String),

    #[error("reminder response decode failed: {0}")]
    Decode(String),
}
