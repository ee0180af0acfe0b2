//! # Host-driven frame scheduler.
//!
//! [`TickScheduler`] relays the host's per-frame callbacks to every registered
//! system in registration order. Each [`tick`](TickScheduler::tick) begins a
//! new scheduling quantum on the [`EventBus`], which is when deferred
//! unsubscriptions take effect.
//!
//! ```text
//! host frame N:
//!   tick()       ─► bus.advance() ─► sys[0].tick() ─► sys[1].tick() ─► ...
//!   late_tick()  ─►                  sys[0].late_tick() ─► ... ─► enlisted components
//! ```
//!
//! The scheduler does not know which systems are gated; a [`Gated`](crate::Gated)
//! system simply no-ops until its own setup completes.
//!
//! Components outside the registration list reach `late_tick` by publishing
//! themselves on [`LATE_TICK_REGISTER`]; they are enlisted once per identity
//! and released at teardown.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::systems::{LateTickRef, SystemRef};
use crate::topics::{Callback1, EventBus};

/// Topic on which components publish a [`LateTickRef`] to get `late_tick` every frame.
pub const LATE_TICK_REGISTER: &str = "late_tick.register";

type LateList = Mutex<Vec<LateTickRef>>;

/// Drives the synchronous hooks of every registered system.
pub struct TickScheduler {
    systems: Arc<[SystemRef]>,
    late: Arc<LateList>,
    bus: EventBus,
    frames: AtomicU64,
}

impl TickScheduler {
    /// Creates a scheduler over `systems`, in the given order, advancing `bus` every frame.
    pub fn new(systems: Arc<[SystemRef]>, bus: EventBus) -> Self {
        Self {
            systems,
            late: Arc::new(Mutex::new(Vec::new())),
            bus,
            frames: AtomicU64::new(0),
        }
    }

    /// Calls `start` on every system, in registration order.
    pub fn start_all(&self) {
        for sys in self.systems.iter() {
            sys.start();
        }
    }

    /// Begins a new frame: applies due removals, then calls every `tick`.
    ///
    /// Returns the frame number (starting at 1).
    pub fn tick(&self) -> u64 {
        self.bus.advance();
        for sys in self.systems.iter() {
            sys.tick();
        }
        self.frames.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Calls every system's `late_tick`, then every enlisted component's, within the current frame.
    pub fn late_tick(&self) {
        for sys in self.systems.iter() {
            sys.late_tick();
        }
        // Snapshot so a component may enlist another one from its own hook.
        let components = lock(&self.late).clone();
        for component in components {
            component.late_tick();
        }
    }

    /// Runs [`tick`](Self::tick) then [`late_tick`](Self::late_tick).
    pub fn frame(&self) -> u64 {
        let n = self.tick();
        self.late_tick();
        n
    }

    /// Enlists a late-tick component directly. Returns `false` if it was already enlisted.
    pub fn enlist(&self, component: &LateTickRef) -> bool {
        enlist(&self.late, component)
    }

    /// Number of enlisted late-tick components.
    pub fn late_components(&self) -> usize {
        lock(&self.late).len()
    }

    /// Callback that enlists the published component, meant for [`LATE_TICK_REGISTER`].
    ///
    /// Holds the list weakly, so the bus never keeps the scheduler's components alive.
    pub(crate) fn registrar(&self) -> Callback1<LateTickRef> {
        let late = Arc::downgrade(&self.late);
        Callback1::new(move |component: &LateTickRef| {
            if let Some(late) = late.upgrade() {
                if enlist(&late, component) {
                    tracing::debug!("late-tick component enlisted");
                }
            }
            Ok(())
        })
    }

    /// Calls `dispose` on every system, in reverse registration order, then
    /// releases every enlisted component.
    ///
    /// `on_disposed` is invoked with each system's name right after its hook ran.
    pub(crate) fn dispose_all(&self, mut on_disposed: impl FnMut(&str)) {
        for sys in self.systems.iter().rev() {
            sys.dispose();
            on_disposed(sys.name());
        }
        lock(&self.late).clear();
    }

    /// Number of frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    /// Number of registered systems.
    pub fn len(&self) -> usize {
        self.systems.len()
    }

    /// True when no systems are registered.
    pub fn is_empty(&self) -> bool {
        self.systems.is_empty()
    }
}

fn lock(late: &LateList) -> MutexGuard<'_, Vec<LateTickRef>> {
    late.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Identity is the component's allocation, as for bus callbacks.
fn enlist(late: &LateList, component: &LateTickRef) -> bool {
    let id = Arc::as_ptr(component) as *const ();
    let mut late = lock(late);
    if late.iter().any(|c| Arc::as_ptr(c) as *const () == id) {
        return false;
    }
    late.push(Arc::clone(component));
    true
}

impl std::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("systems", &self.systems.len())
            .field("late_components", &self.late_components())
            .field("frames", &self.frames())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::systems::{GameSystem, LateTick};
    use crate::topics::Callback0;
    use std::sync::Mutex;

    struct Tracer {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl GameSystem for Tracer {
        fn name(&self) -> &str {
            self.name
        }
        fn start(&self) {
            self.log.lock().unwrap().push(format!("start {}", self.name));
        }
        fn tick(&self) {
            self.log.lock().unwrap().push(format!("tick {}", self.name));
        }
        fn late_tick(&self) {
            self.log.lock().unwrap().push(format!("late {}", self.name));
        }
        fn dispose(&self) {
            self.log.lock().unwrap().push(format!("dispose {}", self.name));
        }
    }

    fn scheduler(log: &Arc<Mutex<Vec<String>>>, bus: EventBus) -> TickScheduler {
        let systems: Vec<SystemRef> = ["a", "b"]
            .into_iter()
            .map(|name| {
                Arc::new(Tracer {
                    name,
                    log: Arc::clone(log),
                }) as SystemRef
            })
            .collect();
        TickScheduler::new(systems.into(), bus)
    }

    #[test]
    fn test_hook_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sched = scheduler(&log, EventBus::new());

        sched.start_all();
        assert_eq!(sched.frame(), 1);
        let mut disposed = Vec::new();
        sched.dispose_all(|name| disposed.push(name.to_string()));

        assert_eq!(
            *log.lock().unwrap(),
            vec![
                "start a", "start b", "tick a", "tick b", "late a", "late b", "dispose b",
                "dispose a"
            ]
        );
        assert_eq!(disposed, vec!["b", "a"]);
    }

    #[test]
    fn test_tick_advances_bus_quantum() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        let sched = scheduler(&log, bus.clone());

        let cb = Callback0::new(|| Ok(()));
        bus.subscribe("evt", &cb).unwrap();
        let _removal = bus.unsubscribe("evt", &cb);
        assert_eq!(bus.subscriber_count("evt"), 1);

        assert_eq!(sched.tick(), 1);
        assert_eq!(bus.quantum(), 1);
        assert_eq!(bus.subscriber_count("evt"), 0);
        assert_eq!(sched.frames(), 1);
    }

    struct Follower {
        log: Arc<Mutex<Vec<String>>>,
    }

    impl LateTick for Follower {
        fn late_tick(&self) {
            self.log.lock().unwrap().push("late follower".to_string());
        }
    }

    #[test]
    fn test_enlisted_components_late_tick_once_per_identity() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        let sched = scheduler(&log, bus.clone());
        let registrar = sched.registrar();
        bus.subscribe(LATE_TICK_REGISTER, &registrar).unwrap();

        let follower: LateTickRef = Arc::new(Follower {
            log: Arc::clone(&log),
        });
        bus.publish_with(LATE_TICK_REGISTER, Arc::clone(&follower)).unwrap();
        bus.publish_with(LATE_TICK_REGISTER, Arc::clone(&follower)).unwrap();
        assert_eq!(sched.late_components(), 1);
        assert!(!sched.enlist(&follower));

        sched.late_tick();
        assert_eq!(*log.lock().unwrap(), vec!["late a", "late b", "late follower"]);

        sched.dispose_all(|_| {});
        assert_eq!(sched.late_components(), 0);
        assert_eq!(Arc::strong_count(&follower), 1);
    }

    #[test]
    fn test_registrar_does_not_outlive_scheduler() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let bus = EventBus::new();
        let sched = scheduler(&log, bus.clone());
        bus.subscribe(LATE_TICK_REGISTER, &sched.registrar()).unwrap();
        drop(sched);

        let follower: LateTickRef = Arc::new(Follower { log });
        bus.publish_with(LATE_TICK_REGISTER, Arc::clone(&follower)).unwrap();
        assert_eq!(Arc::strong_count(&follower), 1);
    }
}
