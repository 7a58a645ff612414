//! Wire payloads for the duplex assistant connection.
//!
//! Outbound frames are JSON envelopes; inbound frames are either raw text or
//! JSON carrying the assistant text under one of several well-known keys.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The JSON payload sent to the remote assistant service for one user
/// message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundEnvelope {
    pub text: String,
    pub user_id: String,
    pub session_id: String,
    pub timestamp: DateTime<Utc>,
}

impl OutboundEnvelope {
    /// Build an envelope for `text` in the given session, stamped now.
    pub fn new(text: impl Into<String>, user_id: impl Into<String>, session_id: &Uuid) -> Self {
        Self {
            text: text.into(),
            user_id: user_id.into(),
            session_id: session_id.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Keys probed, in order, for the assistant text in a JSON inbound frame.
const INBOUND_TEXT_KEYS: [&str; 3] = ["response", "message", "text"];

/// Extract the assistant text from a raw inbound frame.
///
/// Attempts a JSON decode and takes the first of `response`, `message`,
/// `text` that is present as a string. Falls back to the raw payload
/// verbatim when decoding fails or none of the keys is present -- a
/// malformed frame is never an error, just literal text.
pub fn extract_assistant_text(raw: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(raw) else {
        return raw.to_string();
    };
    INBOUND_TEXT_KEYS
        .iter()
        .find_map(|key| value.get(key).and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| raw.to_string())
}
