//! Engine wiring: one place that assembles store, transport, controller,
//! and poller, and owns their shared shutdown.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use evoke_core::event::EventBus;
use evoke_core::reminder::NotificationPoller;
use evoke_core::session::SessionController;
use evoke_infra::reminder::HttpReminderClient;
use evoke_infra::store::JsonFileSessionStore;
use evoke_infra::ws::{WsConfig, WsConnectionManager};
use evoke_types::config::EngineConfig;
use evoke_types::connection::ConnectionState;

type Manager = Arc<WsConnectionManager>;

/// Controller as wired for production: JSON-file store + WebSocket
/// transport.
pub type EngineController = Arc<SessionController<JsonFileSessionStore, Manager>>;

type Poller = NotificationPoller<JsonFileSessionStore, Manager, HttpReminderClient>;

/// The assembled engine and its lifecycle.
pub struct EngineHandle {
    pub controller: EngineController,
    pub events: EventBus,
    pub config: EngineConfig,
    manager: Manager,
    poller: Poller,
    cancel: CancellationToken,
    pump: Option<JoinHandle<()>>,
}

impl EngineHandle {
    /// Build and start the engine: connect the transport, load persisted
    /// sessions, start the transport event pump and the reminder poller.
    pub async fn init(config: EngineConfig, data_dir: &Path) -> Self {
        let cancel = CancellationToken::new();
        let events = EventBus::default();

        let (transport_tx, transport_rx) = mpsc::channel(256);
        let manager: Manager = Arc::new(WsConnectionManager::start(
            WsConfig::new(config.ws_url.clone(), config.reconnect_delay()),
            transport_tx,
            &cancel,
        ));

        let store = JsonFileSessionStore::new(data_dir);
        let controller = SessionController::initialize(
            store,
            Arc::clone(&manager),
            events.clone(),
            config.clone(),
            cancel.child_token(),
        )
        .await;

        let pump = tokio::spawn(Arc::clone(&controller).run_transport_events(transport_rx));

        let poller = NotificationPoller::new(
            Arc::clone(&controller),
            HttpReminderClient::new(config.api_base_url.clone()),
            config.reminder_poll_interval(),
            &cancel,
        );
        poller.start(config.user_id.as_str());
        info!(ws_url = %config.ws_url, "engine started");

        Self {
            controller,
            events,
            config,
            manager,
            poller,
            cancel,
            pump: Some(pump),
        }
    }

    /// Live view of the connection state, for the status indicator.
    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.manager.state_receiver()
    }

    /// Stop everything: poll timer, reconnect timer, pending queued-send
    /// timeouts, and the live connection. Nothing fires afterward.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        self.poller.stop();
        self.manager.shutdown().await;
        if let Some(pump) = self.pump.take() {
            let _ = pump.await;
        }
        info!("engine stopped");
    }
}
