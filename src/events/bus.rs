//! # Broadcast channel for lifecycle events.
//!
//! ```text
//!   StartupOrchestrator ──┐
//!                         ├──► LifecycleBus ──► Relay ──► ReadyTracker, observers
//!   Shell::shutdown     ──┘
//! ```
//!
//! Unrelated to the [`EventBus`](crate::EventBus) game systems talk through:
//! it only carries [`Event`] records about startup and teardown. Publishing
//! never blocks; a receiver that falls behind skips the oldest events.

use tokio::sync::broadcast;

use super::event::Event;

/// Sending half of the lifecycle channel.
///
/// Only the shell and its orchestrator hold clones. Once both are dropped the
/// relay sees the channel closed and exits.
#[derive(Clone, Debug)]
pub struct LifecycleBus {
    tx: broadcast::Sender<Event>,
}

impl LifecycleBus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers.
    ///
    /// If there are no receivers, the event is dropped.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Creates a new receiver that will observe subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
