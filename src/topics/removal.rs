//! # Deferred removals.
//!
//! `unsubscribe` never touches the topic registry directly. It queues a
//! [`PendingRemoval`] due at a later quantum and hands back a [`Removal`]
//! future that resolves once the entry is actually gone.
//!
//! ```text
//! quantum n:   unsubscribe(t, cb) ─► queue { t, cb, due: n + delay }
//!              publish(t)         ─► cb still invoked (stale delivery)
//! quantum n+1: advance()          ─► apply due entries ─► Removal resolves
//!              publish(t)         ─► cb not invoked
//! ```

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use super::callback::{Delivery, ListenerKey};
use super::topic::Topic;

/// A removal waiting for its quantum.
pub(crate) struct PendingRemoval {
    pub(crate) topic: Topic,
    pub(crate) key: ListenerKey,
    /// Holds the callback's allocation so `key` stays unique while queued.
    pub(crate) _hold: Delivery,
    pub(crate) due: u64,
    pub(crate) done: oneshot::Sender<()>,
}

impl PendingRemoval {
    /// Signals the waiting [`Removal`], if anyone still holds it.
    pub(crate) fn resolve(self) {
        let _ = self.done.send(());
    }
}

/// Completion handle of a deferred unsubscribe.
///
/// Awaiting it is optional: dropping the handle does not cancel the removal.
/// Resolves when the removal was applied, when the bus was cleared, or
/// immediately if the request was a no-op (invalid topic).
#[derive(Debug)]
pub struct Removal {
    rx: Option<oneshot::Receiver<()>>,
}

impl Removal {
    pub(crate) fn pending(rx: oneshot::Receiver<()>) -> Self {
        Self { rx: Some(rx) }
    }

    pub(crate) fn ready() -> Self {
        Self { rx: None }
    }

    /// Returns `true` once the removal has been applied (non-blocking).
    pub fn is_applied(&mut self) -> bool {
        match self.rx.as_mut() {
            None => true,
            Some(rx) => match rx.try_recv() {
                Ok(()) | Err(oneshot::error::TryRecvError::Closed) => {
                    self.rx = None;
                    true
                }
                Err(oneshot::error::TryRecvError::Empty) => false,
            },
        }
    }
}

impl Future for Removal {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        match this.rx.as_mut() {
            None => Poll::Ready(()),
            Some(rx) => match Pin::new(rx).poll(cx) {
                Poll::Ready(_) => {
                    this.rx = None;
                    Poll::Ready(())
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}
