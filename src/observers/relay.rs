//! Delivery of lifecycle events from the broadcast channel to the tracker and
//! the observers.
//!
//! The relay holds the only receiver and no sender. It stops after the
//! terminal event, or once every sender is gone because the shell was dropped
//! without a shutdown; either way the observers are released with it.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;

use super::Observe;
use crate::core::ReadyTracker;
use crate::error::panic_message;
use crate::events::Event;

pub(crate) struct Relay {
    observers: Vec<Arc<dyn Observe>>,
    tracker: Arc<ReadyTracker>,
}

impl Relay {
    pub(crate) fn new(observers: Vec<Arc<dyn Observe>>, tracker: Arc<ReadyTracker>) -> Self {
        Self { observers, tracker }
    }

    /// Runs the relay on its own task. Must be called from within a tokio runtime.
    pub(crate) fn spawn(self, rx: broadcast::Receiver<Event>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }

    async fn run(self, mut rx: broadcast::Receiver<Event>) {
        loop {
            match rx.recv().await {
                Ok(ev) => {
                    self.deliver(&ev).await;
                    if ev.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "lifecycle relay lagged");
                }
                Err(RecvError::Closed) => {
                    tracing::debug!("lifecycle channel closed without shutdown");
                    break;
                }
            }
        }
    }

    async fn deliver(&self, ev: &Event) {
        self.tracker.update(ev).await;
        for observer in &self.observers {
            let handled = AssertUnwindSafe(observer.on_event(ev)).catch_unwind().await;
            if let Err(panic) = handled {
                tracing::warn!(
                    observer = observer.name(),
                    seq = ev.seq,
                    panic = panic_message(&*panic),
                    "observer panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SetupState;
    use crate::events::{EventKind, LifecycleBus};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl Observe for Recorder {
        async fn on_event(&self, ev: &Event) {
            self.seen.lock().unwrap().push(ev.seq);
        }
    }

    struct Exploding;

    #[async_trait]
    impl Observe for Exploding {
        async fn on_event(&self, _ev: &Event) {
            panic!("boom");
        }
    }

    #[tokio::test]
    async fn test_panicking_observer_does_not_starve_others() {
        let bus = LifecycleBus::new(16);
        let tracker = Arc::new(ReadyTracker::new());
        let rec = Arc::new(Recorder::default());
        let observers = vec![
            Arc::new(Exploding) as Arc<dyn Observe>,
            rec.clone() as Arc<dyn Observe>,
        ];
        let relay = Relay::new(observers, Arc::clone(&tracker)).spawn(bus.subscribe());

        let started = Event::new(EventKind::SetupStarting).with_system("a");
        let done = Event::new(EventKind::ShutdownCompleted);
        let want = vec![started.seq, done.seq];
        bus.publish(started);
        bus.publish(done);
        relay.await.unwrap();

        assert_eq!(*rec.seen.lock().unwrap(), want);
        assert_eq!(tracker.state("a").await, Some(SetupState::Pending));
    }

    #[tokio::test]
    async fn test_stops_when_every_sender_is_gone() {
        let bus = LifecycleBus::new(16);
        let rec = Arc::new(Recorder::default());
        let observers = vec![rec.clone() as Arc<dyn Observe>];
        let relay = Relay::new(observers, Arc::new(ReadyTracker::new())).spawn(bus.subscribe());

        bus.publish(Event::new(EventKind::StartupCompleted));
        drop(bus);
        relay.await.unwrap();

        assert_eq!(rec.seen.lock().unwrap().len(), 1);
        assert_eq!(Arc::strong_count(&rec), 1);
    }
}
