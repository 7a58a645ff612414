//! FIFO buffer for envelopes produced while no live connection exists.
//!
//! Shared between the caller side (`send` while disconnected) and the
//! connection task (drain on open). Bounded only by memory.

use evoke_types::envelope::OutboundEnvelope;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Cloneable handle to the shared outbound queue.
#[derive(Debug, Clone, Default)]
pub struct MessageQueue {
    inner: Arc<Mutex<VecDeque<OutboundEnvelope>>>,
}

impl MessageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an envelope to the back of the queue.
    pub fn push(&self, envelope: OutboundEnvelope) {
        self.inner.lock().expect("queue lock poisoned").push_back(envelope);
    }

    /// Take everything currently queued, in FIFO order.
    pub fn drain_all(&self) -> Vec<OutboundEnvelope> {
        self.inner
            .lock()
            .expect("queue lock poisoned")
            .drain(..)
            .collect()
    }

    /// Put back envelopes that could not be sent, ahead of anything queued
    /// since the drain, preserving their original order.
    pub fn requeue_front(&self, envelopes: Vec<OutboundEnvelope>) {
        let mut queue = self.inner.lock().expect("queue lock poisoned");
        for envelope in envelopes.into_iter().rev() {
            queue.push_front(envelope);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("queue lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
