//! Session controller: the single entry point for every mutation of the
//! session registry.
//!
//! Orchestrates session lifecycle (create, switch, delete-message), appends
//! user and assistant messages, drives the per-session in-flight state
//! machine, and persists after every change. All mutable state sits behind
//! one async mutex, so appends within a session are observed in call/arrival
//! order regardless of which task produced them.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use evoke_types::config::EngineConfig;
use evoke_types::connection::ConnectionState;
use evoke_types::envelope::{OutboundEnvelope, extract_assistant_text};
use evoke_types::error::ControllerError;
use evoke_types::event::EngineEvent;
use evoke_types::message::Message;
use evoke_types::session::{Session, SessionRegistry};

use crate::event::EventBus;
use crate::session::store::SessionStore;
use crate::transport::{SendOutcome, Transport, TransportEvent};

/// Greeting seeded into every new session.
pub const GREETING: &str = "Hello! I'm your AI assistant. How can I help you today?";

/// Informational message emitted when a queued send has not been flushed
/// within the configured bound.
pub const QUEUED_SEND_NOTICE: &str = "Connecting to AI service... Please wait a moment";

struct ControllerState {
    registry: SessionRegistry,
    /// Id of the session user input currently targets. Always present in
    /// the registry.
    current: Uuid,
    /// Sessions with an outbound request awaiting its reply.
    in_flight: HashSet<Uuid>,
    /// True while persistence is failing and the engine runs on in-memory
    /// state only.
    degraded: bool,
}

/// Orchestrates session lifecycle, message persistence, and delivery.
///
/// Generic over the `SessionStore` and `Transport` ports so tests can
/// substitute fakes. Constructed via [`SessionController::initialize`],
/// which returns a shared handle.
pub struct SessionController<S, T> {
    store: S,
    transport: T,
    events: EventBus,
    config: EngineConfig,
    cancel: CancellationToken,
    state: Mutex<ControllerState>,
}

impl<S, T> SessionController<S, T>
where
    S: SessionStore + 'static,
    T: Transport + 'static,
{
    /// Load persisted state and build the controller.
    ///
    /// With no persisted sessions, a fresh greeting session is created and
    /// persisted; otherwise the most recently created session becomes
    /// current. A failing load does not abort: the engine starts from an
    /// empty in-memory registry flagged as degraded.
    pub async fn initialize(
        store: S,
        transport: T,
        events: EventBus,
        config: EngineConfig,
        cancel: CancellationToken,
    ) -> Arc<Self> {
        let (registry, degraded) = match store.load().await {
            Ok(registry) => (registry, false),
            Err(e) => {
                warn!(error = %e, "failed to load session registry, starting empty");
                (SessionRegistry::new(), true)
            }
        };

        let current = registry.front().map(|s| s.id);
        let controller = Arc::new(Self {
            store,
            transport,
            events,
            config,
            cancel,
            state: Mutex::new(ControllerState {
                registry,
                current: current.unwrap_or_else(Uuid::nil),
                in_flight: HashSet::new(),
                degraded,
            }),
        });

        match current {
            Some(id) => debug!(session_id = %id, "resuming most recent session"),
            None => {
                controller.create_session().await;
            }
        }
        controller
    }

    // --- Session lifecycle ---

    /// Create a fresh session seeded with the assistant greeting, insert it
    /// at the front of the registry, persist, and make it current.
    pub async fn create_session(&self) -> Session {
        let mut session = Session::new();
        session.push_message(Message::assistant(GREETING));

        let mut state = self.state.lock().await;
        state.current = session.id;
        state
            .registry
            .push_front(session.clone(), self.config.session_cap);
        info!(session_id = %session.id, "session created");
        self.events.publish(EngineEvent::MessageAppended {
            session_id: session.id,
            message: session.messages[0].clone(),
        });
        self.persist_and_notify(&mut state).await;
        session
    }

    /// Make `id` the current session.
    ///
    /// An unknown id is a checked signal (`SessionNotFound`), never a fault;
    /// nothing changes in that case.
    pub async fn switch_session(&self, id: &Uuid) -> Result<Session, ControllerError> {
        let mut state = self.state.lock().await;
        let session = state
            .registry
            .get(id)
            .cloned()
            .ok_or(ControllerError::SessionNotFound)?;
        state.current = *id;
        debug!(session_id = %id, "switched session");
        Ok(session)
    }

    /// Remove the message at `index` from the given session's log.
    ///
    /// Out-of-range indices and unknown sessions are no-ops. Returns whether
    /// a message was removed.
    pub async fn delete_message(&self, session_id: &Uuid, index: usize) -> bool {
        let mut state = self.state.lock().await;
        let removed = state
            .registry
            .get_mut(session_id)
            .is_some_and(|session| session.delete_message(index));
        if removed {
            self.persist_and_notify(&mut state).await;
        }
        removed
    }

    // --- Outbound path ---

    /// Append a user message to the current session and hand it to the
    /// transport.
    ///
    /// Rejects empty input (`EmptyInput`) and concurrent sends within one
    /// session (`Busy`) without appending anything. On success the session
    /// is in flight until the reply, a transport failure, or the
    /// queued-send timeout resolves it.
    pub async fn append_user_message(
        self: &Arc<Self>,
        text: &str,
    ) -> Result<SendOutcome, ControllerError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ControllerError::EmptyInput);
        }

        let mut state = self.state.lock().await;
        let current = state.current;
        if state.in_flight.contains(&current) {
            return Err(ControllerError::Busy);
        }
        let message = Message::user(trimmed);
        let Some(session) = state.registry.get_mut(&current) else {
            return Err(ControllerError::SessionNotFound);
        };
        session.push_message(message.clone());
        self.events.publish(EngineEvent::MessageAppended {
            session_id: current,
            message,
        });
        self.persist_and_notify(&mut state).await;
        state.in_flight.insert(current);

        let envelope = OutboundEnvelope::new(trimmed, self.config.user_id.as_str(), &current);
        let outcome = self.transport.send(envelope).await;
        match outcome {
            SendOutcome::Sent => {
                debug!(session_id = %current, "message transmitted");
            }
            SendOutcome::Queued => {
                debug!(session_id = %current, "message queued, transport not open");
                drop(state);
                self.spawn_queued_send_timeout(current);
            }
            SendOutcome::Failed => {
                warn!(session_id = %current, "transport rejected message");
                state.in_flight.remove(&current);
            }
        }
        Ok(outcome)
    }

    /// After the configured bound, surface a single informational message
    /// for a send that is still waiting in the queue and return the flight
    /// to idle so the user may send again. A late reply is still accepted
    /// by [`Self::on_inbound_payload`].
    fn spawn_queued_send_timeout(self: &Arc<Self>, session_id: Uuid) {
        let controller = Arc::clone(self);
        let timeout = self.config.queued_send_timeout();
        tokio::spawn(async move {
            tokio::select! {
                _ = controller.cancel.cancelled() => {}
                _ = tokio::time::sleep(timeout) => {
                    controller.on_queued_send_timeout(session_id).await;
                }
            }
        });
    }

    async fn on_queued_send_timeout(&self, session_id: Uuid) {
        // Liveness check: the engine may have shut down while this timer
        // was pending.
        if self.cancel.is_cancelled() {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.in_flight.remove(&session_id) {
            // The reply (or a transport error) already resolved the flight.
            return;
        }
        info!(session_id = %session_id, "queued send still pending, emitting notice");
        let message = Message::assistant(QUEUED_SEND_NOTICE);
        if let Some(session) = state.registry.get_mut(&session_id) {
            session.push_message(message.clone());
            self.events.publish(EngineEvent::MessageAppended {
                session_id,
                message,
            });
            self.persist_and_notify(&mut state).await;
        }
    }

    // --- Inbound path ---

    /// Handle a raw inbound frame from the transport.
    ///
    /// Produces exactly one assistant message on the current session
    /// (structured decode with raw-text fallback), clears the in-flight
    /// flag, and persists.
    pub async fn on_inbound_payload(&self, raw: &str) {
        let text = extract_assistant_text(raw);
        let mut state = self.state.lock().await;
        let current = state.current;
        state.in_flight.remove(&current);
        let message = Message::assistant(text);
        if let Some(session) = state.registry.get_mut(&current) {
            session.push_message(message.clone());
        }
        self.events.publish(EngineEvent::MessageAppended {
            session_id: current,
            message,
        });
        self.persist_and_notify(&mut state).await;
    }

    /// Append a server-originated reminder to the current session.
    ///
    /// Reminders are independent of the send/reply cycle and never touch
    /// the in-flight flag.
    pub async fn append_reminder(&self, text: &str) {
        let mut state = self.state.lock().await;
        let current = state.current;
        let message = Message::assistant(text);
        if let Some(session) = state.registry.get_mut(&current) {
            session.push_message(message.clone());
        }
        self.events.publish(EngineEvent::MessageAppended {
            session_id: current,
            message,
        });
        self.persist_and_notify(&mut state).await;
    }

    // --- Transport event pump ---

    /// Consume transport events until the engine shuts down or the
    /// transport side drops its sender.
    pub async fn run_transport_events(self: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                event = events.recv() => {
                    let Some(event) = event else { break };
                    self.on_transport_event(event).await;
                }
            }
        }
        debug!("transport event pump stopped");
    }

    async fn on_transport_event(&self, event: TransportEvent) {
        match event {
            TransportEvent::Open => {
                info!("transport open");
                self.events
                    .publish(EngineEvent::ConnectionStateChanged(ConnectionState::Open));
            }
            TransportEvent::Message(raw) => {
                self.on_inbound_payload(&raw).await;
            }
            TransportEvent::Error(error) => {
                warn!(%error, "transport error");
                self.resolve_flights_on_disconnect().await;
            }
            TransportEvent::Closed { code, reason } => {
                info!(?code, %reason, "transport closed");
                self.resolve_flights_on_disconnect().await;
            }
        }
    }

    /// A dropped connection resolves every pending flight to idle. The user
    /// sees the connectivity indicator, not a failure message.
    async fn resolve_flights_on_disconnect(&self) {
        let mut state = self.state.lock().await;
        state.in_flight.clear();
        drop(state);
        self.events
            .publish(EngineEvent::ConnectionStateChanged(
                ConnectionState::Reconnecting,
            ));
    }

    // --- Observers ---

    /// Snapshot of the current session.
    pub async fn current_session(&self) -> Session {
        let state = self.state.lock().await;
        state
            .registry
            .get(&state.current)
            .cloned()
            .unwrap_or_default()
    }

    /// Id of the current session.
    pub async fn current_session_id(&self) -> Uuid {
        self.state.lock().await.current
    }

    /// Snapshot of the full registry.
    pub async fn registry_snapshot(&self) -> SessionRegistry {
        self.state.lock().await.registry.clone()
    }

    /// Whether the current session has a send awaiting its reply.
    pub async fn is_in_flight(&self) -> bool {
        let state = self.state.lock().await;
        state.in_flight.contains(&state.current)
    }

    // --- Persistence ---

    /// Persist the registry and publish the registry-changed notification.
    ///
    /// A failing save never aborts the engine: the in-memory state stays
    /// authoritative and the notification carries `degraded: true` until a
    /// later save succeeds.
    async fn persist_and_notify(&self, state: &mut ControllerState) {
        match self.store.save(&state.registry).await {
            Ok(()) => {
                if state.degraded {
                    info!("session persistence recovered");
                }
                state.degraded = false;
            }
            Err(e) => {
                warn!(error = %e, "failed to persist session registry");
                state.degraded = true;
            }
        }
        self.events.publish(EngineEvent::RegistryChanged {
            registry: state.registry.clone(),
            degraded: state.degraded,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evoke_types::error::StoreError;
    use evoke_types::message::Role;

    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    // --- Fakes ---

    #[derive(Clone, Default)]
    struct MemoryStore {
        inner: Arc<MemoryStoreInner>,
    }

    #[derive(Default)]
    struct MemoryStoreInner {
        registry: StdMutex<SessionRegistry>,
        fail_saves: AtomicBool,
    }

    impl MemoryStore {
        fn fail_saves(&self, fail: bool) {
            self.inner.fail_saves.store(fail, Ordering::SeqCst);
        }

        fn persisted(&self) -> SessionRegistry {
            self.inner.registry.lock().unwrap().clone()
        }

        fn seed(&self, registry: SessionRegistry) {
            *self.inner.registry.lock().unwrap() = registry;
        }
    }

    impl SessionStore for MemoryStore {
        async fn load(&self) -> Result<SessionRegistry, StoreError> {
            Ok(self.persisted())
        }

        async fn save(&self, registry: &SessionRegistry) -> Result<(), StoreError> {
            if self.inner.fail_saves.load(Ordering::SeqCst) {
                return Err(StoreError::Io("disk unavailable".to_string()));
            }
            *self.inner.registry.lock().unwrap() = registry.clone();
            Ok(())
        }

        async fn get(&self, id: &Uuid) -> Result<Option<Session>, StoreError> {
            Ok(self.persisted().get(id).cloned())
        }
    }

    #[derive(Clone)]
    struct FakeTransport {
        inner: Arc<FakeTransportInner>,
    }

    struct FakeTransportInner {
        sent: StdMutex<Vec<OutboundEnvelope>>,
        outcome: StdMutex<SendOutcome>,
    }

    impl FakeTransport {
        fn new(outcome: SendOutcome) -> Self {
            Self {
                inner: Arc::new(FakeTransportInner {
                    sent: StdMutex::new(Vec::new()),
                    outcome: StdMutex::new(outcome),
                }),
            }
        }

        fn set_outcome(&self, outcome: SendOutcome) {
            *self.inner.outcome.lock().unwrap() = outcome;
        }

        fn sent(&self) -> Vec<OutboundEnvelope> {
            self.inner.sent.lock().unwrap().clone()
        }
    }

    impl Transport for FakeTransport {
        async fn send(&self, envelope: OutboundEnvelope) -> SendOutcome {
            let outcome = *self.inner.outcome.lock().unwrap();
            if outcome != SendOutcome::Failed {
                self.inner.sent.lock().unwrap().push(envelope);
            }
            outcome
        }

        fn state(&self) -> ConnectionState {
            ConnectionState::Open
        }
    }

    type TestController = Arc<SessionController<MemoryStore, FakeTransport>>;

    async fn controller_with(
        store: MemoryStore,
        transport: FakeTransport,
    ) -> (TestController, EventBus) {
        let bus = EventBus::new(64);
        let controller = SessionController::initialize(
            store,
            transport,
            bus.clone(),
            EngineConfig::default(),
            CancellationToken::new(),
        )
        .await;
        (controller, bus)
    }

    async fn fresh_controller() -> (TestController, MemoryStore, FakeTransport) {
        let store = MemoryStore::default();
        let transport = FakeTransport::new(SendOutcome::Sent);
        let (controller, _) = controller_with(store.clone(), transport.clone()).await;
        (controller, store, transport)
    }

    fn roles(session: &Session) -> Vec<Role> {
        session.messages.iter().map(|m| m.role).collect()
    }

    // --- Initialization ---

    #[tokio::test]
    async fn empty_storage_yields_one_greeting_session() {
        let (controller, store, _) = fresh_controller().await;

        let registry = controller.registry_snapshot().await;
        assert_eq!(registry.len(), 1);
        let session = registry.front().unwrap();
        assert_eq!(session.messages.len(), 1);
        assert_eq!(session.messages[0].role, Role::Assistant);
        assert_eq!(session.messages[0].content, GREETING);

        // The greeting session was persisted, not just held in memory.
        assert_eq!(store.persisted().len(), 1);
    }

    #[tokio::test]
    async fn existing_storage_resumes_most_recent_session() {
        let store = MemoryStore::default();
        let mut seeded = SessionRegistry::new();
        let older = Session::new();
        let newer = Session::new();
        seeded.push_front(older.clone(), 50);
        seeded.push_front(newer.clone(), 50);
        store.seed(seeded);

        let (controller, _) =
            controller_with(store, FakeTransport::new(SendOutcome::Sent)).await;

        assert_eq!(controller.current_session_id().await, newer.id);
        assert_eq!(controller.registry_snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn failing_load_starts_empty_and_degraded() {
        let bus = EventBus::new(64);
        let mut rx = bus.subscribe();
        let _controller = SessionController::initialize(
            FailingLoadStore,
            FakeTransport::new(SendOutcome::Sent),
            bus.clone(),
            EngineConfig::default(),
            CancellationToken::new(),
        )
        .await;

        // initialize created a greeting session; its save went through the
        // failing store, so the notification is degraded.
        loop {
            match rx.try_recv() {
                Ok(EngineEvent::RegistryChanged { degraded, registry }) => {
                    assert!(degraded);
                    assert_eq!(registry.len(), 1);
                    break;
                }
                Ok(_) => continue,
                Err(e) => panic!("no registry notification: {e:?}"),
            }
        }
    }

    struct FailingLoadStore;

    impl SessionStore for FailingLoadStore {
        async fn load(&self) -> Result<SessionRegistry, StoreError> {
            Err(StoreError::Io("no backing file".to_string()))
        }

        async fn save(&self, _registry: &SessionRegistry) -> Result<(), StoreError> {
            Err(StoreError::Io("still unavailable".to_string()))
        }

        async fn get(&self, _id: &Uuid) -> Result<Option<Session>, StoreError> {
            Ok(None)
        }
    }

    // --- Outbound / inbound ---

    #[tokio::test]
    async fn send_and_reply_round_trip() {
        let (controller, _, transport) = fresh_controller().await;
        let current = controller.current_session_id().await;

        let outcome = controller.append_user_message("hello").await.unwrap();
        assert_eq!(outcome, SendOutcome::Sent);

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].text, "hello");
        assert_eq!(sent[0].session_id, current.to_string());
        assert_eq!(sent[0].user_id, "user123");
        assert!(controller.is_in_flight().await);

        controller.on_inbound_payload(r#"{"response":"hi"}"#).await;

        let session = controller.current_session().await;
        assert_eq!(session.messages.last().unwrap().content, "hi");
        assert_eq!(session.messages.last().unwrap().role, Role::Assistant);
        assert!(!controller.is_in_flight().await);
    }

    #[tokio::test]
    async fn message_log_preserves_call_and_arrival_order() {
        let (controller, _, _) = fresh_controller().await;

        controller.append_user_message("first").await.unwrap();
        controller.on_inbound_payload("reply one").await;
        controller.append_user_message("second").await.unwrap();
        controller.on_inbound_payload(r#"{"text":"reply two"}"#).await;

        let session = controller.current_session().await;
        let contents: Vec<_> = session
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(
            contents,
            [GREETING, "first", "reply one", "second", "reply two"]
        );
        assert_eq!(
            roles(&session),
            [
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }

    #[tokio::test]
    async fn empty_input_is_rejected_without_append() {
        let (controller, _, transport) = fresh_controller().await;

        let err = controller.append_user_message("   \n").await.unwrap_err();
        assert_eq!(err, ControllerError::EmptyInput);
        assert!(transport.sent().is_empty());
        assert_eq!(controller.current_session().await.messages.len(), 1);
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_busy() {
        let (controller, _, transport) = fresh_controller().await;

        controller.append_user_message("one").await.unwrap();
        let err = controller.append_user_message("two").await.unwrap_err();
        assert_eq!(err, ControllerError::Busy);
        assert_eq!(transport.sent().len(), 1);

        // The reply resolves the flight and sending works again.
        controller.on_inbound_payload("ack").await;
        controller.append_user_message("two").await.unwrap();
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn transport_failure_returns_flight_to_idle() {
        let (controller, _, transport) = fresh_controller().await;
        transport.set_outcome(SendOutcome::Failed);

        let outcome = controller.append_user_message("lost").await.unwrap();
        assert_eq!(outcome, SendOutcome::Failed);
        assert!(!controller.is_in_flight().await);

        // No failure message was appended -- connectivity is surfaced
        // elsewhere.
        let session = controller.current_session().await;
        assert_eq!(session.messages.last().unwrap().content, "lost");
    }

    #[tokio::test]
    async fn disconnect_clears_pending_flights() {
        let (controller, _, _) = fresh_controller().await;
        controller.append_user_message("pending").await.unwrap();
        assert!(controller.is_in_flight().await);

        controller
            .on_transport_event(TransportEvent::Closed {
                code: Some(1006),
                reason: String::new(),
            })
            .await;
        assert!(!controller.is_in_flight().await);
    }

    // --- Queued-send timeout ---

    #[tokio::test(start_paused = true)]
    async fn queued_send_times_out_with_notice_and_idle() {
        let (controller, _, transport) = fresh_controller().await;
        transport.set_outcome(SendOutcome::Queued);

        let outcome = controller.append_user_message("offline").await.unwrap();
        assert_eq!(outcome, SendOutcome::Queued);
        assert!(controller.is_in_flight().await);

        // Let the 2-second timeout elapse on the virtual clock.
        tokio::time::sleep(Duration::from_secs(3)).await;

        let session = controller.current_session().await;
        assert_eq!(
            session.messages.last().unwrap().content,
            QUEUED_SEND_NOTICE
        );
        assert!(!controller.is_in_flight().await);

        // Policy: the user may send again after the notice.
        assert_eq!(
            controller.append_user_message("again").await.unwrap(),
            SendOutcome::Queued
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reply_before_timeout_suppresses_notice() {
        let (controller, _, transport) = fresh_controller().await;
        transport.set_outcome(SendOutcome::Queued);

        controller.append_user_message("offline").await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;
        controller.on_inbound_payload("made it").await;
        tokio::time::sleep(Duration::from_secs(5)).await;

        let session = controller.current_session().await;
        let contents: Vec<_> = session
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, [GREETING, "offline", "made it"]);
    }

    #[tokio::test(start_paused = true)]
    async fn late_reply_after_timeout_is_still_appended() {
        let (controller, _, transport) = fresh_controller().await;
        transport.set_outcome(SendOutcome::Queued);

        controller.append_user_message("slow").await.unwrap();
        tokio::time::sleep(Duration::from_secs(3)).await;
        controller.on_inbound_payload("finally").await;

        let session = controller.current_session().await;
        let contents: Vec<_> = session
            .messages
            .iter()
            .map(|m| m.content.as_str())
            .collect();
        assert_eq!(contents, [GREETING, "slow", QUEUED_SEND_NOTICE, "finally"]);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_cancels_pending_timeout() {
        let store = MemoryStore::default();
        let transport = FakeTransport::new(SendOutcome::Queued);
        let cancel = CancellationToken::new();
        let controller = SessionController::initialize(
            store,
            transport,
            EventBus::new(64),
            EngineConfig::default(),
            cancel.clone(),
        )
        .await;

        controller.append_user_message("doomed").await.unwrap();
        cancel.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;

        // No notice was appended after shutdown.
        let session = controller.current_session().await;
        assert_eq!(session.messages.last().unwrap().content, "doomed");
    }

    // --- Session lifecycle ---

    #[tokio::test]
    async fn create_session_becomes_current_and_front() {
        let (controller, _, _) = fresh_controller().await;
        let first = controller.current_session_id().await;

        let created = controller.create_session().await;
        assert_ne!(created.id, first);
        assert_eq!(controller.current_session_id().await, created.id);
        let registry = controller.registry_snapshot().await;
        assert_eq!(registry.front().unwrap().id, created.id);
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn switch_session_unknown_id_is_checked_signal() {
        let (controller, _, _) = fresh_controller().await;
        let before = controller.current_session_id().await;

        let err = controller.switch_session(&Uuid::now_v7()).await.unwrap_err();
        assert_eq!(err, ControllerError::SessionNotFound);
        assert_eq!(controller.current_session_id().await, before);
    }

    #[tokio::test]
    async fn switch_session_changes_append_target() {
        let (controller, _, _) = fresh_controller().await;
        let first = controller.current_session_id().await;
        controller.create_session().await;

        controller.switch_session(&first).await.unwrap();
        controller.append_user_message("to the old one").await.unwrap();

        let registry = controller.registry_snapshot().await;
        assert_eq!(registry.get(&first).unwrap().message_count, 2);
    }

    #[tokio::test]
    async fn registry_caps_at_fifty_sessions() {
        let (controller, _, _) = fresh_controller().await;
        for _ in 0..55 {
            controller.create_session().await;
        }
        assert_eq!(controller.registry_snapshot().await.len(), 50);
    }

    #[tokio::test]
    async fn delete_message_persists_and_ignores_out_of_range() {
        let (controller, store, _) = fresh_controller().await;
        let id = controller.current_session_id().await;
        controller.append_user_message("disposable").await.unwrap();

        assert!(controller.delete_message(&id, 1).await);
        assert_eq!(controller.current_session().await.messages.len(), 1);
        assert_eq!(store.persisted().get(&id).unwrap().messages.len(), 1);

        assert!(!controller.delete_message(&id, 10).await);
        assert!(!controller.delete_message(&Uuid::now_v7(), 0).await);
    }

    // --- Reminders and notifications ---

    #[tokio::test]
    async fn reminder_appends_without_touching_flight() {
        let (controller, _, transport) = fresh_controller().await;
        transport.set_outcome(SendOutcome::Sent);
        controller.append_user_message("busy now").await.unwrap();

        controller.append_reminder("Meeting in 10 minutes").await;

        assert!(controller.is_in_flight().await);
        let session = controller.current_session().await;
        assert_eq!(
            session.messages.last().unwrap().content,
            "Meeting in 10 minutes"
        );
    }

    #[tokio::test]
    async fn failing_save_reports_degraded_then_recovers() {
        let (controller, store, _) = fresh_controller().await;
        let bus_events = {
            let (c, bus) = (&controller, &controller.events);
            let mut rx = bus.subscribe();
            store.fail_saves(true);
            c.append_reminder("while degraded").await;
            store.fail_saves(false);
            c.append_reminder("after recovery").await;
            let mut seen = Vec::new();
            while let Ok(event) = rx.try_recv() {
                if let EngineEvent::RegistryChanged { degraded, .. } = event {
                    seen.push(degraded);
                }
            }
            seen
        };
        assert_eq!(bus_events, [true, false]);
        // In-memory state kept both messages despite the failed save.
        assert_eq!(controller.current_session().await.messages.len(), 3);
    }
}
