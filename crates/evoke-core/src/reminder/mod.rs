//! Reminder port and the notification poller.
//!
//! A secondary, independent polling loop: on a fixed interval (plus one
//! immediate check at start) it asks the reminder endpoint whether the user
//! has a pending reminder, injects the reminder text into the active
//! session as an assistant message, and acknowledges it server-side.
//!
//! The loop is one sequential task: check, append, acknowledge are awaited
//! in order, so a single server-side pending reminder can never be appended
//! twice -- the next check only happens after the acknowledgement
//! round-trip completed. Poll failures are logged and the loop continues.

use std::sync::Arc;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use evoke_types::error::ReminderError;

use crate::session::controller::SessionController;
use crate::session::store::SessionStore;
use crate::transport::Transport;

/// Port for the reminder-check endpoints.
///
/// Uses native async fn in traits (RPITIT); the HTTP implementation lives
/// in `evoke-infra`, tests use scripted fakes.
pub trait ReminderClient: Send + Sync {
    /// Ask whether the user has a pending reminder; returns its text.
    fn check(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<Option<String>, ReminderError>> + Send;

    /// Mark the user's pending reminder as read so it is not re-delivered.
    fn acknowledge(
        &self,
        user_id: &str,
    ) -> impl std::future::Future<Output = Result<(), ReminderError>> + Send;
}

/// Timer-driven poller feeding server-originated reminders into the
/// session controller.
pub struct NotificationPoller<S, T, R> {
    controller: Arc<SessionController<S, T>>,
    client: R,
    interval: Duration,
    cancel: CancellationToken,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl<S, T, R> NotificationPoller<S, T, R>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
    R: ReminderClient + Clone + 'static,
{
    /// Create a poller (not yet started). Its lifetime is bounded by a
    /// child of `parent_cancel`: engine shutdown stops the loop.
    pub fn new(
        controller: Arc<SessionController<S, T>>,
        client: R,
        interval: Duration,
        parent_cancel: &CancellationToken,
    ) -> Self {
        Self {
            controller,
            client,
            interval,
            cancel: parent_cancel.child_token(),
            handle: StdMutex::new(None),
        }
    }

    /// Start polling for `user_id`. Idempotent: a second call while the
    /// loop is running is a no-op.
    pub fn start(&self, user_id: impl Into<String>) {
        let mut handle = self.handle.lock().expect("poller lock poisoned");
        if handle.is_some() {
            return;
        }

        let user_id = user_id.into();
        let controller = Arc::clone(&self.controller);
        let client = self.client.clone();
        let interval = self.interval;
        let cancel = self.cancel.clone();
        info!(%user_id, interval_secs = interval.as_secs(), "reminder poller started");

        *handle = Some(tokio::spawn(async move {
            loop {
                // Immediate first check, then one per interval.
                poll_once(&controller, &client, &user_id).await;
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("reminder poller stopped");
        }));
    }

    /// Stop the poll loop. No tick fires afterward.
    pub fn stop(&self) {
        self.cancel.cancel();
        if let Some(handle) = self.handle.lock().expect("poller lock poisoned").take() {
            handle.abort();
        }
    }
}

/// One poll tick: check, append, acknowledge. Failures are logged and
/// swallowed -- the loop must survive any network error.
async fn poll_once<S, T, R>(
    controller: &Arc<SessionController<S, T>>,
    client: &R,
    user_id: &str,
) where
    S: SessionStore + 'static,
    T: Transport + 'static,
    R: ReminderClient,
{
    match client.check(user_id).await {
        Ok(Some(text)) => {
            info!(%user_id, "pending reminder received");
            controller.append_reminder(&text).await;
            if let Err(e) = client.acknowledge(user_id).await {
                // The reminder stays pending server-side; the next tick
                // may deliver it again, which is correct until the ack
                // lands.
                warn!(error = %e, "failed to acknowledge reminder");
            }
        }
        Ok(None) => {}
        Err(e) => {
            warn!(error = %e, "reminder check failed");
        }
    }
}
