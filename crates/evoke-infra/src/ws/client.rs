//! Reconnecting WebSocket connection manager.
//!
//! One owner task drives the whole connection lifecycle: connect, drain the
//! offline queue, pump frames, and on any drop sleep a fixed delay before
//! the single reconnect attempt. Because the loop is the only place a
//! reconnect can be scheduled, at most one reconnect timer exists at any
//! instant -- the cap is structural, not policed.
//!
//! State is published on a `watch` channel; inbound payloads and
//! transitions surface as `TransportEvent`s on an `mpsc` channel the engine
//! pumps into the session controller.

use std::sync::Mutex as StdMutex;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use evoke_core::transport::{MessageQueue, SendOutcome, Transport, TransportEvent};
use evoke_types::connection::ConnectionState;
use evoke_types::envelope::OutboundEnvelope;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Connection parameters.
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// WebSocket endpoint of the assistant service.
    pub url: String,
    /// Delay between a drop and the reconnect attempt.
    pub reconnect_delay: Duration,
}

impl WsConfig {
    pub fn new(url: impl Into<String>, reconnect_delay: Duration) -> Self {
        Self {
            url: url.into(),
            reconnect_delay,
        }
    }
}

enum ConnectionExit {
    /// Socket closed or errored; reconnect.
    Dropped,
    /// Teardown requested; do not reconnect.
    Cancelled,
}

/// Owns the duplex connection to the assistant service.
///
/// Constructed with [`WsConnectionManager::start`], which spawns the single
/// owner task -- there is exactly one connection (or connection attempt)
/// per manager, ever. `shutdown` closes the socket cleanly and guarantees
/// no reconnect timer fires afterward.
pub struct WsConnectionManager {
    queue: MessageQueue,
    command_tx: mpsc::Sender<OutboundEnvelope>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
    handle: StdMutex<Option<JoinHandle<()>>>,
}

impl WsConnectionManager {
    /// Spawn the connection task and return the manager handle.
    ///
    /// `events` receives inbound payloads and state transitions; the
    /// manager's lifetime is bounded by a child of `parent_cancel`.
    pub fn start(
        config: WsConfig,
        events: mpsc::Sender<TransportEvent>,
        parent_cancel: &CancellationToken,
    ) -> Self {
        let queue = MessageQueue::new();
        let (command_tx, command_rx) = mpsc::channel(64);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);
        let cancel = parent_cancel.child_token();

        let task = run_connection_loop(
            config,
            queue.clone(),
            command_rx,
            events,
            state_tx,
            cancel.clone(),
        );
        Self {
            queue,
            command_tx,
            state_rx,
            cancel,
            handle: StdMutex::new(Some(tokio::spawn(task))),
        }
    }

    /// Watch channel carrying the connection state (for status indicators).
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Number of envelopes waiting for the transport to reopen.
    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    /// Close the connection and stop the loop. No reconnect fires after
    /// this returns.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.handle.lock().expect("manager lock poisoned").take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}

impl Transport for WsConnectionManager {
    async fn send(&self, envelope: OutboundEnvelope) -> SendOutcome {
        if self.state().is_open() {
            match self.command_tx.send(envelope).await {
                Ok(()) => SendOutcome::Sent,
                // The owner task is gone; nothing will ever transmit this.
                Err(_) => SendOutcome::Failed,
            }
        } else {
            self.queue.push(envelope);
            SendOutcome::Queued
        }
    }

    fn state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }
}

/// The owner task: connect, serve, reconnect after a fixed delay, forever,
/// until cancelled.
async fn run_connection_loop(
    config: WsConfig,
    queue: MessageQueue,
    mut command_rx: mpsc::Receiver<OutboundEnvelope>,
    events: mpsc::Sender<TransportEvent>,
    state_tx: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    loop {
        if cancel.is_cancelled() {
            break;
        }
        let _ = state_tx.send(ConnectionState::Connecting);
        debug!(url = %config.url, "connecting");

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(config.url.as_str()) => result,
        };

        match connected {
            Ok((stream, _response)) => {
                info!(url = %config.url, "connection open");
                let _ = state_tx.send(ConnectionState::Open);
                let (mut sink, mut source) = stream.split();

                match drain_queue(&mut sink, &queue).await {
                    Ok(drained) => {
                        if drained > 0 {
                            info!(count = drained, "drained queued envelopes");
                        }
                        let _ = events.send(TransportEvent::Open).await;
                        let exit = serve_connection(
                            &mut sink,
                            &mut source,
                            &mut command_rx,
                            &queue,
                            &events,
                            &cancel,
                        )
                        .await;
                        if matches!(exit, ConnectionExit::Cancelled) {
                            break;
                        }
                    }
                    Err(error) => {
                        warn!(%error, "failed to flush queue after connect");
                        let _ = events.send(TransportEvent::Error(error)).await;
                    }
                }
            }
            Err(e) => {
                debug!(error = %e, "connect failed");
                let _ = events.send(TransportEvent::Error(e.to_string())).await;
            }
        }

        if cancel.is_cancelled() {
            break;
        }
        let _ = state_tx.send(ConnectionState::Reconnecting);
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
    let _ = state_tx.send(ConnectionState::Closed);
    debug!("connection loop stopped");
}

/// Flush everything queued while disconnected, in FIFO order.
///
/// A failed send mid-drain puts the unsent tail back at the front of the
/// queue -- nothing is silently dropped -- and reports the error so the
/// loop reconnects.
async fn drain_queue(sink: &mut WsSink, queue: &MessageQueue) -> Result<usize, String> {
    let pending = queue.drain_all();
    let total = pending.len();
    let mut remaining = pending.into_iter();
    while let Some(envelope) = remaining.next() {
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "failed to encode queued envelope, dropping it");
                continue;
            }
        };
        if let Err(e) = sink.send(Message::text(payload)).await {
            let mut unsent = vec![envelope];
            unsent.extend(remaining);
            queue.requeue_front(unsent);
            return Err(e.to_string());
        }
    }
    Ok(total)
}

/// Pump one live connection: outbound commands and inbound frames.
async fn serve_connection(
    sink: &mut WsSink,
    source: &mut WsSource,
    command_rx: &mut mpsc::Receiver<OutboundEnvelope>,
    queue: &MessageQueue,
    events: &mpsc::Sender<TransportEvent>,
    cancel: &CancellationToken,
) -> ConnectionExit {
    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return ConnectionExit::Cancelled;
            }
            command = command_rx.recv() => {
                let Some(envelope) = command else {
                    return ConnectionExit::Cancelled;
                };
                let payload = match serde_json::to_string(&envelope) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "failed to encode envelope, dropping it");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::text(payload)).await {
                    // Keep the envelope for the next connection.
                    queue.requeue_front(vec![envelope]);
                    let _ = events.send(TransportEvent::Error(e.to_string())).await;
                    return ConnectionExit::Dropped;
                }
            }
            frame = source.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Message(text.to_string())).await;
                    }
                    Some(Ok(Message::Close(close))) => {
                        let (code, reason) = match close {
                            Some(frame) => (Some(u16::from(frame.code)), frame.reason.to_string()),
                            None => (None, String::new()),
                        };
                        let _ = events.send(TransportEvent::Closed { code, reason }).await;
                        return ConnectionExit::Dropped;
                    }
                    // Ping/pong are handled by the protocol layer; binary
                    // frames are not part of this wire format.
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        let _ = events.send(TransportEvent::Error(e.to_string())).await;
                        return ConnectionExit::Dropped;
                    }
                    None => {
                        let _ = events
                            .send(TransportEvent::Closed { code: None, reason: String::new() })
                            .await;
                        return ConnectionExit::Dropped;
                    }
                }
            }
        }
    }
}
