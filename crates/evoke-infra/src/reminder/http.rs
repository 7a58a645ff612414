//! HTTP implementation of the reminder port.
//!
//! Talks to the assistant backend's reminder endpoints:
//! `GET {base}/check-reminders/{user_id}` returning
//! `{"has_reminder": bool, "message": string?}`, and
//! `POST {base}/mark-reminder-read/{user_id}` to acknowledge.

use serde::Deserialize;

use evoke_core::reminder::ReminderClient;
use evoke_types::error::ReminderError;

/// Reqwest-backed reminder client.
#[derive(Clone)]
pub struct HttpReminderClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpReminderClient {
    /// Create a client for the given API base URL (trailing slash
    /// tolerated).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    fn check_url(&self, user_id: &str) -> String {
        format!("{}/check-reminders/{}", self.base_url, user_id)
    }

    fn ack_url(&self, user_id: &str) -> String {
        format!("{}/mark-reminder-read/{}", self.base_url, user_id)
    }
}

#[derive(Debug, Deserialize)]
struct ReminderCheckResponse {
    has_reminder: bool,
    #[serde(default)]
    message: Option<String>,
}

/// Map the wire response to the pending reminder text, if any.
fn into_pending(response: ReminderCheckResponse) -> Option<String> {
    if response.has_reminder {
        Some(response.message.unwrap_or_default())
    } else {
        None
    }
}

impl ReminderClient for HttpReminderClient {
    async fn check(&self, user_id: &str) -> Result<Option<String>, ReminderError> {
        let response = self
            .client
            .get(self.check_url(user_id))
            .send()
            .await
            .map_err(|e| ReminderError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| ReminderError::Http(e.to_string()))?;

        let body: ReminderCheckResponse = response
            .json()
            .await
            .map_err(|e| ReminderError::Decode(e.to_string()))?;
        Ok(into_pending(body))
    }

    async fn acknowledge(&self, user_id: &str) -> Result<(), ReminderError> {
        self.client
            .post(self.ack_url(user_id))
            .send()
            .await
            .map_err(|e| ReminderError::Http(e.to_string()))?
            .error_for_status()
            .map_err(|e| ReminderError::Http(e.to_string()))?;
        Ok(())
    }
}
