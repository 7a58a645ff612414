//! Engine events published to external consumers.
//!
//! Consumers (dashboards, the CLI renderer) subscribe through the engine's
//! broadcast bus. Receivers get clones -- mutating a received registry has
//! no effect on the engine's state.

use uuid::Uuid;

use crate::connection::ConnectionState;
use crate::message::Message;
use crate::session::SessionRegistry;

/// An observable state change inside the engine.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    /// The session registry was persisted (or a persist was attempted).
    ///
    /// `degraded` is true when the save failed and the engine is running on
    /// in-memory state only -- durability is lost for the remainder of the
    /// process, but the engine keeps functioning.
    RegistryChanged {
        registry: SessionRegistry,
        degraded: bool,
    },

    /// The transport changed state (connectivity indicator feed).
    ConnectionStateChanged(ConnectionState),

    /// A message was appended to a session.
    MessageAppended { session_id: Uuid, message: Message },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_are_cloneable() {
        let event = EngineEvent::RegistryChanged {
            registry: SessionRegistry::new(),
            degraded: false,
        };
        let copy = event.clone();
        assert!(matches!(
            copy,
            EngineEvent::RegistryChanged {
                degraded: false,
                ..
            }
        ));
    }
}
