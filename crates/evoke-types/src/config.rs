//! Engine configuration.
//!
//! Deserialized from `config.toml` in the data directory; every field has a
//! default so a missing or partial file still yields a working engine.

use serde::{Deserialize, Serialize};

use std::time::Duration;

/// Tunable parameters for the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// WebSocket endpoint of the assistant service.
    pub ws_url: String,

    /// Base URL for the reminder-check HTTP endpoints.
    pub api_base_url: String,

    /// Identity sent in every outbound envelope and reminder check.
    pub user_id: String,

    /// Delay before a reconnect attempt after a drop.
    pub reconnect_delay_secs: u64,

    /// Interval between reminder polls.
    pub reminder_poll_secs: u64,

    /// How long a queued send may wait before the informational
    /// "still connecting" message is emitted.
    pub queued_send_timeout_secs: u64,

    /// Maximum number of retained sessions.
    pub session_cap: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ws_url: "ws://localhost:8000/ws".to_string(),
            api_base_url: "http://localhost:8000".to_string(),
            user_id: "user123".to_string(),
            reconnect_delay_secs: 3,
            reminder_poll_secs: 10,
            queued_send_timeout_secs: 2,
            session_cap: 50,
        }
    }
}

impl EngineConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn reminder_poll_interval(&self) -> Duration {
        Duration::from_secs(self.reminder_poll_secs)
    }

    pub fn queued_send_timeout(&self) -> Duration {
        Duration::from_secs(self.queued_send_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.ws_url, "ws://localhost:8000/ws");
        assert_eq!(config.user_id, "user123");
        assert_eq!(config.reconnect_delay(), Duration::from_secs(3));
        assert_eq!(config.reminder_poll_interval(), Duration::from_secs(10));
        assert_eq!(config.queued_send_timeout(), Duration::from_secs(2));
        assert_eq!(config.session_cap, 50);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: EngineConfig = toml::from_str(
            r#"
ws_url = "ws://assistant.internal:9001/ws"
user_id = "ada"
"#,
        )
        .unwrap();
        assert_eq!(config.ws_url, "ws://assistant.internal:9001/ws");
        assert_eq!(config.user_id, "ada");
        // Unspecified fields keep their defaults.
        assert_eq!(config.session_cap, 50);
        assert_eq!(config.reconnect_delay_secs, 3);
    }

    #[test]
    fn test_empty_toml_is_all_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.api_base_url, "http://localhost:8000");
    }
}
