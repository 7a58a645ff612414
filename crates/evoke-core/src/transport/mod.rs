//! Transport port: the duplex connection as seen by the engine.
//!
//! The concrete WebSocket connection manager lives in `evoke-infra`; the
//! controller and the tests only know this interface. Sends are
//! fire-and-forget -- replies arrive later as independent
//! `TransportEvent::Message`s.

pub mod queue;

pub use queue::MessageQueue;

use evoke_types::connection::ConnectionState;
use evoke_types::envelope::OutboundEnvelope;

/// What happened to a `send` attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// Transmitted on the live connection.
    Sent,
    /// Held in the message queue for delivery once the transport reopens.
    Queued,
    /// The transport could not accept the payload at all.
    Failed,
}

/// Events raised by the connection manager toward the engine.
#[derive(Debug, Clone)]
pub enum TransportEvent {
    /// The connection is open; any queued envelopes have been drained.
    Open,
    /// An inbound frame arrived.
    Message(String),
    /// The transport failed; a reconnect will be scheduled.
    Error(String),
    /// The connection closed.
    Closed { code: Option<u16>, reason: String },
}

/// Port for the outbound half of the duplex connection.
///
/// Uses native async fn in traits (RPITIT); implementations live in
/// `evoke-infra` and in test fakes.
pub trait Transport: Send + Sync {
    /// Deliver an envelope: transmit immediately when open, queue otherwise.
    fn send(
        &self,
        envelope: OutboundEnvelope,
    ) -> impl std::future::Future<Output = SendOutcome> + Send;

    /// Current connection state (observed, never mutated by callers).
    fn state(&self) -> ConnectionState;
}

/// A shared transport handle is itself a transport, so the controller and
/// the shutdown path can hold the same connection manager.
impl<T: Transport> Transport for std::sync::Arc<T> {
    fn send(
        &self,
        envelope: OutboundEnvelope,
    ) -> impl std::future::Future<Output = SendOutcome> + Send {
        T::send(&**self, envelope)
    }

    fn state(&self) -> ConnectionState {
        T::state(&**self)
    }
}
