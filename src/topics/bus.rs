//! # Topic-keyed event bus with deferred removal.
//!
//! [`EventBus`] lets game systems announce named occurrences with 0, 1 or 2
//! typed payload values without holding references to each other.
//!
//! ## Architecture
//! ```text
//! subscribe(t, cb) ──► DashMap<Topic, HashMap<ListenerKey, Delivery>>
//!                                    │
//! publish(t, ..)   ──► snapshot ─────┘ (lock released) ──► cb(..) for each matching arity/type
//!
//! unsubscribe(t, cb) ──► pending queue (due = quantum + delay) ──► Removal
//! advance()          ──► quantum += 1 ─► apply due removals ─► drop empty topics
//! ```
//!
//! ## Rules
//! - **Thread-safe**: every operation takes `&self`; the bus is cheap to clone (`Arc` inside).
//! - **Re-entrant**: callbacks run without any registry lock held, so they may
//!   subscribe, unsubscribe or publish themselves.
//! - **Deferred removal**: a publish in the quantum of an `unsubscribe` still
//!   sees the callback (at most one stale delivery per in-flight cycle).
//! - **Fail-fast**: the first callback error is logged and returned, remaining
//!   subscribers of that publish are skipped. Panics are logged and resumed.
//! - **No ordering** between subscribers of one topic.
//! - Publishing to an empty or unknown topic is a no-op and creates nothing.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind, resume_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashmap::DashMap;
use tokio::sync::oneshot;

use super::callback::{Delivery, Listener, ListenerKey};
use super::removal::{PendingRemoval, Removal};
use super::topic::Topic;
use crate::error::{BusError, HandlerResult, panic_message};

type Listeners = HashMap<ListenerKey, Delivery>;

struct Inner {
    topics: DashMap<Topic, Listeners>,
    pending: Mutex<Vec<PendingRemoval>>,
    quantum: AtomicU64,
    delay: u64,
}

/// Publish/subscribe bus shared by all game systems of a shell.
///
/// ### Properties
/// - **Cloneable**: clones share the same registry.
/// - **Quantum-driven**: removals are applied by [`advance`](Self::advance),
///   which the [`TickScheduler`](crate::TickScheduler) calls at the start of every frame.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use tickvisor::{Callback1, EventBus};
///
/// let bus = EventBus::new();
/// let total = Arc::new(AtomicU32::new(0));
/// let sink = Arc::clone(&total);
/// let on_score = Callback1::new(move |points: &u32| {
///     sink.fetch_add(*points, Ordering::SeqCst);
///     Ok(())
/// });
///
/// bus.subscribe("score", &on_score).unwrap();
/// bus.publish_with("score", 5u32).unwrap();
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// ```
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Creates a bus that applies removals one quantum after they are requested.
    pub fn new() -> Self {
        Self::with_delay(1)
    }

    /// Creates a bus that applies removals `delay` quanta after they are requested.
    ///
    /// The delay is clamped to a minimum of 1.
    pub fn with_delay(delay: u64) -> Self {
        Self {
            inner: Arc::new(Inner {
                topics: DashMap::new(),
                pending: Mutex::new(Vec::new()),
                quantum: AtomicU64::new(0),
                delay: delay.max(1),
            }),
        }
    }

    /// Adds `callback` to the subscriber set of `topic`, creating the topic if absent.
    ///
    /// Subscribing the same callback handle twice keeps a single subscription.
    pub fn subscribe<L: Listener>(&self, topic: &str, callback: &L) -> Result<(), BusError> {
        let topic = Topic::new(topic)?;
        let key = callback.key();
        tracing::debug!(topic = %topic, ?key, "subscribe");
        self.inner
            .topics
            .entry(topic)
            .or_default()
            .entry(key)
            .or_insert_with(|| callback.delivery());
        Ok(())
    }

    /// Schedules removal of `callback` from `topic` for a later quantum.
    ///
    /// Invalid topics are ignored and yield an already-resolved [`Removal`].
    pub fn unsubscribe<L: Listener>(&self, topic: &str, callback: &L) -> Removal {
        let Ok(topic) = Topic::new(topic) else {
            return Removal::ready();
        };
        let (done, rx) = oneshot::channel();
        let mut pending = self.pending();
        let due = self.quantum() + self.inner.delay;
        tracing::debug!(topic = %topic, due, "unsubscribe deferred");
        pending.push(PendingRemoval {
            topic,
            key: callback.key(),
            _hold: callback.delivery(),
            due,
            done,
        });
        Removal::pending(rx)
    }

    /// Publishes `topic` without payload to every nullary subscriber.
    pub fn publish(&self, topic: &str) -> Result<(), BusError> {
        self.dispatch(topic, |d| d.call0())
    }

    /// Publishes `topic` with one payload value to every `Callback1<T>` subscriber.
    pub fn publish_with<T: 'static>(&self, topic: &str, value: T) -> Result<(), BusError> {
        self.dispatch(topic, |d| d.call1(&value))
    }

    /// Publishes `topic` with two payload values to every `Callback2<A, B>` subscriber.
    pub fn publish_pair<A: 'static, B: 'static>(
        &self,
        topic: &str,
        a: A,
        b: B,
    ) -> Result<(), BusError> {
        self.dispatch(topic, |d| d.call2(&a, &b))
    }

    /// Empties the whole registry and resolves every pending removal.
    pub fn clear(&self) {
        self.inner.topics.clear();
        let drained: Vec<_> = self.pending().drain(..).collect();
        tracing::debug!(pending = drained.len(), "bus cleared");
        drained.into_iter().for_each(PendingRemoval::resolve);
    }

    /// Enters the next quantum and applies every removal that became due.
    ///
    /// Returns the new quantum number.
    pub fn advance(&self) -> u64 {
        let (now, due) = {
            let mut pending = self.pending();
            let now = self.inner.quantum.fetch_add(1, Ordering::AcqRel) + 1;
            let (due, keep): (Vec<_>, Vec<_>) = pending.drain(..).partition(|r| r.due <= now);
            *pending = keep;
            (now, due)
        };
        if !due.is_empty() {
            tracing::debug!(quantum = now, removals = due.len(), "applying removals");
        }
        for removal in due {
            self.apply(removal);
        }
        now
    }

    /// Applies every pending removal immediately, regardless of its quantum.
    ///
    /// Used by the shell's teardown. Returns the number of removals applied.
    pub fn flush(&self) -> usize {
        let all: Vec<_> = self.pending().drain(..).collect();
        let n = all.len();
        for removal in all {
            self.apply(removal);
        }
        n
    }

    /// Returns the current quantum number.
    pub fn quantum(&self) -> u64 {
        self.inner.quantum.load(Ordering::Acquire)
    }

    /// Returns the number of topics with at least one subscriber.
    pub fn topic_count(&self) -> usize {
        self.inner.topics.len()
    }

    /// Returns `true` if `topic` currently has a registry entry.
    pub fn contains_topic(&self, topic: &str) -> bool {
        self.inner.topics.contains_key(topic)
    }

    /// Returns the number of callbacks subscribed to `topic` (all arities).
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.inner.topics.get(topic).map_or(0, |l| l.len())
    }

    /// Returns the number of removals waiting for their quantum.
    pub fn pending_removals(&self) -> usize {
        self.pending().len()
    }

    fn pending(&self) -> MutexGuard<'_, Vec<PendingRemoval>> {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn apply(&self, removal: PendingRemoval) {
        let emptied = match self.inner.topics.get_mut(&removal.topic) {
            Some(mut listeners) => {
                listeners.remove(&removal.key);
                listeners.is_empty()
            }
            None => false,
        };
        if emptied {
            self.inner
                .topics
                .remove_if(&removal.topic, |_, listeners| listeners.is_empty());
            tracing::debug!(topic = %removal.topic, "topic dropped");
        }
        removal.resolve();
    }

    /// Snapshots the subscribers of `topic` and invokes `call` on each, lock-free.
    fn dispatch<F>(&self, topic: &str, call: F) -> Result<(), BusError>
    where
        F: Fn(&Delivery) -> Option<HandlerResult>,
    {
        if !Topic::is_valid(topic) {
            return Ok(());
        }
        let snapshot: Vec<Delivery> = match self.inner.topics.get(topic) {
            Some(listeners) => listeners.values().cloned().collect(),
            None => return Ok(()),
        };

        for delivery in &snapshot {
            let outcome = match catch_unwind(AssertUnwindSafe(|| call(delivery))) {
                Ok(outcome) => outcome,
                Err(panic) => {
                    tracing::error!(topic, panic = panic_message(&*panic), "subscriber panicked");
                    resume_unwind(panic);
                }
            };
            if let Some(Err(source)) = outcome {
                tracing::error!(topic, error = %source, "subscriber failed");
                return Err(BusError::HandlerFailed {
                    topic: topic.to_string(),
                    source,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.topic_count())
            .field("quantum", &self.quantum())
            .field("pending_removals", &self.pending_removals())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HandlerError;
    use crate::topics::{Callback0, Callback1, Callback2};
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Callback0) {
        let hits = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&hits);
        let cb = Callback0::new(move || {
            sink.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        (hits, cb)
    }

    #[test]
    fn test_every_subscriber_invoked_once() {
        let bus = EventBus::new();
        let subs: Vec<_> = (0..5).map(|_| counter()).collect();
        for (_, cb) in &subs {
            bus.subscribe("wave.started", cb).unwrap();
        }
        bus.publish("wave.started").unwrap();
        for (hits, _) in &subs {
            assert_eq!(hits.load(Ordering::SeqCst), 1);
        }
    }

    #[test]
    fn test_same_handle_stored_once() {
        let bus = EventBus::new();
        let (hits, cb) = counter();
        bus.subscribe("x", &cb).unwrap();
        bus.subscribe("x", &cb.clone()).unwrap();
        assert_eq!(bus.subscriber_count("x"), 1);
        bus.publish("x").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_invalid_topic_rejected_on_subscribe() {
        let bus = EventBus::new();
        let (_, cb) = counter();
        let err = bus.subscribe("  ", &cb).unwrap_err();
        assert!(matches!(err, BusError::InvalidTopic { .. }));
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_publish_to_nobody_is_noop() {
        let bus = EventBus::new();
        bus.publish("").unwrap();
        bus.publish("nobody").unwrap();
        bus.publish_with("nobody", 1u8).unwrap();
        assert!(!bus.contains_topic("nobody"));
    }

    #[test]
    fn test_payload_types_select_subscribers() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::<String>::new()));

        let s = Arc::clone(&seen);
        let on_u32 = Callback1::new(move |n: &u32| {
            s.lock().unwrap().push(format!("u32:{n}"));
            Ok(())
        });
        let s = Arc::clone(&seen);
        let on_str = Callback1::new(move |v: &&'static str| {
            s.lock().unwrap().push(format!("str:{v}"));
            Ok(())
        });
        let s = Arc::clone(&seen);
        let on_pair = Callback2::new(move |id: &u32, name: &String| {
            s.lock().unwrap().push(format!("pair:{id}:{name}"));
            Ok(())
        });
        let (unit_hits, on_unit) = counter();

        bus.subscribe("evt", &on_u32).unwrap();
        bus.subscribe("evt", &on_str).unwrap();
        bus.subscribe("evt", &on_pair).unwrap();
        bus.subscribe("evt", &on_unit).unwrap();

        bus.publish_with("evt", 3u32).unwrap();
        bus.publish_with("evt", "hi").unwrap();
        bus.publish_pair("evt", 9u32, String::from("orc")).unwrap();
        bus.publish_with("evt", 3u64).unwrap();

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["pair:9:orc", "str:hi", "u32:3"]);
        assert_eq!(unit_hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unsubscribe_deferred_to_next_quantum() {
        let bus = EventBus::new();
        let (hits, f) = counter();
        bus.subscribe("X", &f).unwrap();

        bus.publish("X").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        let mut removal = bus.unsubscribe("X", &f);
        bus.publish("X").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2, "stale delivery in same quantum");
        assert!(!removal.is_applied());

        bus.advance();
        assert!(removal.is_applied());
        bus.publish("X").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_last_removal_drops_topic() {
        let bus = EventBus::new();
        let (_, a) = counter();
        let (_, b) = counter();
        bus.subscribe("t", &a).unwrap();
        bus.subscribe("t", &b).unwrap();

        let _ = bus.unsubscribe("t", &a);
        bus.advance();
        assert!(bus.contains_topic("t"));

        let _ = bus.unsubscribe("t", &b);
        bus.advance();
        assert!(!bus.contains_topic("t"));

        bus.publish("t").unwrap();
        assert!(!bus.contains_topic("t"));
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_self_unsubscribe_during_publish() {
        let bus = EventBus::new();
        let hits = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Callback0>>> = Arc::new(Mutex::new(None));

        let (bus2, hits2, slot2) = (bus.clone(), Arc::clone(&hits), Arc::clone(&slot));
        let once = Callback0::new(move || {
            hits2.fetch_add(1, Ordering::SeqCst);
            if let Some(me) = slot2.lock().unwrap().as_ref() {
                let _ = bus2.unsubscribe("tick", me);
            }
            Ok(())
        });
        *slot.lock().unwrap() = Some(once.clone());

        let (others, other) = counter();
        bus.subscribe("tick", &once).unwrap();
        bus.subscribe("tick", &other).unwrap();

        bus.publish("tick").unwrap();
        assert_eq!(others.load(Ordering::SeqCst), 1);
        assert_eq!(bus.pending_removals(), 1);

        bus.advance();
        bus.publish("tick").unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert_eq!(others.load(Ordering::SeqCst), 2);
        slot.lock().unwrap().take();
    }

    #[test]
    fn test_reentrant_subscribe_does_not_deadlock() {
        let bus = EventBus::new();
        let (late_hits, late) = counter();
        let (bus2, late2) = (bus.clone(), late.clone());
        let adder = Callback0::new(move || {
            bus2.subscribe("grow", &late2).map_err(|e| HandlerError::new(e.to_string()))
        });
        bus.subscribe("grow", &adder).unwrap();

        bus.publish("grow").unwrap();
        assert_eq!(late_hits.load(Ordering::SeqCst), 0, "not in the snapshot");
        bus.publish("grow").unwrap();
        assert_eq!(late_hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_handler_error_propagates() {
        let bus = EventBus::new();
        let failing = Callback0::new(|| Err(HandlerError::new("broken")));
        bus.subscribe("boom", &failing).unwrap();

        let err = bus.publish("boom").unwrap_err();
        match err {
            BusError::HandlerFailed { topic, source } => {
                assert_eq!(topic, "boom");
                assert_eq!(source.message(), "broken");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_handler_error_aborts_remaining() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut handles = Vec::new();
        for _ in 0..4 {
            let c = Arc::clone(&calls);
            let cb = Callback0::new(move || {
                c.fetch_add(1, Ordering::SeqCst);
                Err(HandlerError::new("stop"))
            });
            bus.subscribe("chain", &cb).unwrap();
            handles.push(cb);
        }
        assert!(bus.publish("chain").is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_panic_is_resumed() {
        let bus = EventBus::new();
        let cb = Callback0::new(|| panic!("subscriber exploded"));
        bus.subscribe("p", &cb).unwrap();
        let res = catch_unwind(AssertUnwindSafe(|| bus.publish("p")));
        assert!(res.is_err());
        assert!(bus.contains_topic("p"));
    }

    #[test]
    fn test_delay_clamped_and_honored() {
        let bus = EventBus::with_delay(0);
        let (_, f) = counter();
        bus.subscribe("d", &f).unwrap();
        let _ = bus.unsubscribe("d", &f);
        bus.advance();
        assert!(!bus.contains_topic("d"));

        let bus = EventBus::with_delay(2);
        bus.subscribe("d", &f).unwrap();
        let _ = bus.unsubscribe("d", &f);
        bus.advance();
        assert!(bus.contains_topic("d"));
        bus.advance();
        assert!(!bus.contains_topic("d"));
    }

    #[test]
    fn test_clear_resolves_pending() {
        let bus = EventBus::new();
        let (_, f) = counter();
        bus.subscribe("a", &f).unwrap();
        bus.subscribe("b", &f).unwrap();
        let mut removal = bus.unsubscribe("a", &f);

        bus.clear();
        assert_eq!(bus.topic_count(), 0);
        assert_eq!(bus.pending_removals(), 0);
        assert!(removal.is_applied());
    }

    #[test]
    fn test_flush_applies_everything() {
        let bus = EventBus::with_delay(10);
        let (_, f) = counter();
        bus.subscribe("a", &f).unwrap();
        let _ = bus.unsubscribe("a", &f);
        let _ = bus.unsubscribe("   ", &f);
        assert_eq!(bus.flush(), 1);
        assert!(!bus.contains_topic("a"));
    }

    #[tokio::test]
    async fn test_removal_future_resolves_after_advance() {
        let bus = EventBus::new();
        let (_, f) = counter();
        bus.subscribe("late", &f).unwrap();
        let removal = bus.unsubscribe("late", &f);

        let driver = bus.clone();
        let handle = tokio::spawn(async move {
            tokio::task::yield_now().await;
            driver.advance();
        });
        removal.await;
        handle.await.unwrap();
        assert!(!bus.contains_topic("late"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_subscribe_and_publish() {
        let bus = EventBus::new();
        let mut tasks = Vec::new();
        for i in 0..8usize {
            let bus = bus.clone();
            tasks.push(tokio::spawn(async move {
                let topic = format!("t{}", i % 2);
                for _ in 0..100 {
                    let cb = Callback1::new(|_: &usize| Ok(()));
                    bus.subscribe(&topic, &cb).unwrap();
                    bus.publish_with(&topic, i).unwrap();
                    let _ = bus.unsubscribe(&topic, &cb);
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }
        bus.advance();
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_dropped_stray_handle_spares_new_subscription() {
        let bus = EventBus::new();
        for _ in 0..50 {
            let (_, stray) = counter();
            let _ = bus.unsubscribe("x", &stray);
            drop(stray);

            let (hits, fresh) = counter();
            bus.subscribe("x", &fresh).unwrap();
            bus.advance();
            bus.publish("x").unwrap();
            assert_eq!(hits.load(Ordering::SeqCst), 1);

            let _ = bus.unsubscribe("x", &fresh);
            bus.advance();
        }
        assert_eq!(bus.topic_count(), 0);
    }

    #[test]
    fn test_quantum_moves_under_pending_lock() {
        let bus = EventBus::new();
        let guard = bus.pending();

        let other = bus.clone();
        let handle = std::thread::spawn(move || other.advance());
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert_eq!(bus.quantum(), 0);

        drop(guard);
        assert_eq!(handle.join().unwrap(), 1);
        assert_eq!(bus.quantum(), 1);
    }

    mod model {
        use super::*;
        use proptest::prelude::*;

        const CALLBACKS: usize = 4;

        #[derive(Debug, Clone)]
        enum Op {
            Subscribe(usize),
            Unsubscribe(usize),
            Advance,
            Publish,
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0..CALLBACKS).prop_map(Op::Subscribe),
                (0..CALLBACKS).prop_map(Op::Unsubscribe),
                Just(Op::Advance),
                Just(Op::Publish),
            ]
        }

        proptest! {
            /// Every publish reaches exactly the callbacks whose removal is not yet due.
            #[test]
            fn deliveries_follow_subscriptions(
                ops in prop::collection::vec(op(), 0..64),
                delay in 1u64..3,
            ) {
                let bus = EventBus::with_delay(delay);
                let handles: Vec<_> = (0..CALLBACKS).map(|_| counter()).collect();

                let mut subscribed = [false; CALLBACKS];
                let mut expected = [0usize; CALLBACKS];
                let mut pending: Vec<(usize, u64)> = Vec::new();
                let mut quantum = 0u64;

                for op in ops {
                    match op {
                        Op::Subscribe(i) => {
                            bus.subscribe("t", &handles[i].1).unwrap();
                            subscribed[i] = true;
                        }
                        Op::Unsubscribe(i) => {
                            let _ = bus.unsubscribe("t", &handles[i].1);
                            pending.push((i, quantum + delay));
                        }
                        Op::Advance => {
                            quantum += 1;
                            prop_assert_eq!(bus.advance(), quantum);
                            pending.retain(|&(i, due)| {
                                if due <= quantum {
                                    subscribed[i] = false;
                                }
                                due > quantum
                            });
                        }
                        Op::Publish => {
                            bus.publish("t").unwrap();
                            for (i, on) in subscribed.iter().enumerate() {
                                if *on {
                                    expected[i] += 1;
                                }
                            }
                        }
                    }
                    prop_assert_eq!(bus.contains_topic("t"), subscribed.iter().any(|on| *on));
                    prop_assert_eq!(bus.pending_removals(), pending.len());
                }

                for (i, (hits, _)) in handles.iter().enumerate() {
                    prop_assert_eq!(hits.load(Ordering::SeqCst), expected[i]);
                }
            }
        }
    }
}
