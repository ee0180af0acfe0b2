//! # Shell: owns the bus, the systems and their startup.
//!
//! The [`Shell`] is the explicitly owned scope every game system lives in. It
//! replaces global lookup with [`Shell::get`] and drives three phases:
//!
//! ```text
//! build()     ──► lifecycle relay spawned (LifecycleBus ─► ReadyTracker + observers)
//!                 scheduler subscribed to LATE_TICK_REGISTER
//!
//! start()     ──► claim startup (once)
//!                 ├─► start() on every system, registration order
//!                 └─► setup() on every participant, serial, registration order
//!
//! host loop   ──► tick()       ─► bus quantum + 1 ─► tick() on every system
//!                 late_tick()  ─► late_tick() on every system, then enlisted components
//!
//! shutdown()  ──► dispose() on every system, reverse order   ─► SystemDisposed
//!                 ├─► unsubscribe LATE_TICK_REGISTER, apply every pending removal, clear the bus
//!                 ├─► ShutdownCompleted
//!                 └─► relay delivers the tail and stops
//!
//! drop without shutdown() ──► lifecycle channel closes ──► relay stops, observers released
//! ```
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use async_trait::async_trait;
//! use tickvisor::{AsyncSystem, Callback0, Config, Gated, Phase, SetupError, Shell};
//!
//! #[derive(Default)]
//! struct Hud {
//!     frames: AtomicU32,
//! }
//!
//! #[async_trait]
//! impl AsyncSystem for Hud {
//!     fn name(&self) -> &str { "hud" }
//!     async fn setup(&self) -> Result<(), SetupError> { Ok(()) }
//!     fn tick(&self) { self.frames.fetch_add(1, Ordering::Relaxed); }
//! }
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = Shell::builder(Config::default());
//!     let bus = builder.bus();
//!     let shell = builder
//!         .with_async_system(Arc::new(Gated::new(Hud::default())))
//!         .build();
//!
//!     shell.tick(); // hud not ready: dropped
//!     shell.start().await?;
//!     assert_eq!(shell.phase(), Phase::Live);
//!
//!     let on_pause = Callback0::new(|| Ok(()));
//!     bus.subscribe("pause", &on_pause)?;
//!     shell.frame();
//!
//!     let hud = shell.get::<Gated<Hud>>().unwrap();
//!     assert_eq!(hud.inner().frames.load(Ordering::Relaxed), 1);
//!
//!     shell.shutdown().await;
//!     assert_eq!(bus.topic_count(), 0);
//!     Ok(())
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;

use super::{
    builder::ShellBuilder,
    config::Config,
    orchestrator::{Phase, StartupOrchestrator},
    ready::ReadyTracker,
    registry::Registry,
    scheduler::{LATE_TICK_REGISTER, TickScheduler},
};
use crate::{
    error::StartupError,
    events::{Event, EventKind, LifecycleBus},
    systems::LateTickRef,
    topics::{Callback1, EventBus},
};

/// Owning scope of a set of game systems.
pub struct Shell {
    cfg: Config,
    bus: EventBus,
    lifecycle: LifecycleBus,
    scheduler: TickScheduler,
    registrar: Callback1<LateTickRef>,
    orchestrator: StartupOrchestrator,
    registry: Registry,
    tracker: Arc<ReadyTracker>,
    relay: Mutex<Option<JoinHandle<()>>>,
    stopped: AtomicBool,
}

impl Shell {
    /// Creates a new builder for a shell.
    pub fn builder(cfg: Config) -> ShellBuilder {
        ShellBuilder::new(cfg)
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_internal(
        cfg: Config,
        bus: EventBus,
        lifecycle: LifecycleBus,
        scheduler: TickScheduler,
        registrar: Callback1<LateTickRef>,
        orchestrator: StartupOrchestrator,
        registry: Registry,
        tracker: Arc<ReadyTracker>,
        relay: JoinHandle<()>,
    ) -> Self {
        Self {
            cfg,
            bus,
            lifecycle,
            scheduler,
            registrar,
            orchestrator,
            registry,
            tracker,
            relay: Mutex::new(Some(relay)),
            stopped: AtomicBool::new(false),
        }
    }

    /// Runs every `start` hook, then awaits every participant's setup in order.
    ///
    /// Returns the first setup failure; participants after it never begin.
    /// A second call fails with [`StartupError::AlreadyStarted`].
    pub async fn start(&self) -> Result<(), StartupError> {
        self.orchestrator.begin()?;
        self.scheduler.start_all();
        self.orchestrator.drive().await
    }

    /// Begins a frame: applies due removals and ticks every system. Returns the frame number.
    pub fn tick(&self) -> u64 {
        self.scheduler.tick()
    }

    /// Calls every system's `late_tick`, then every enlisted [`LateTick`](crate::LateTick) component.
    pub fn late_tick(&self) {
        self.scheduler.late_tick();
    }

    /// Runs a full frame (`tick` then `late_tick`).
    pub fn frame(&self) -> u64 {
        self.scheduler.frame()
    }

    /// Returns the first registered system or participant of type `T`.
    pub fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.registry.get::<T>()
    }

    /// Returns the shell's event bus.
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Returns the configuration the shell was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Returns the startup orchestrator.
    pub fn orchestrator(&self) -> &StartupOrchestrator {
        &self.orchestrator
    }

    /// Returns the frame scheduler.
    pub fn scheduler(&self) -> &TickScheduler {
        &self.scheduler
    }

    /// Returns the participant readiness tracker.
    pub fn tracker(&self) -> &ReadyTracker {
        &self.tracker
    }

    /// Current startup phase.
    pub fn phase(&self) -> Phase {
        self.orchestrator.phase()
    }

    /// True once every participant completed its setup.
    pub fn is_live(&self) -> bool {
        self.orchestrator.is_live()
    }

    /// Waits until startup reaches `Live`, `Failed` or `Stopped`.
    pub async fn wait_settled(&self) -> Phase {
        self.orchestrator.wait_settled().await
    }

    /// Names of participants whose setup started but has not finished.
    ///
    /// Eventually consistent with the orchestrator.
    pub async fn stalled(&self) -> Vec<String> {
        self.tracker.stalled().await
    }

    /// Tears the shell down.
    ///
    /// Disposes every system in reverse registration order, releases the
    /// late-tick components, applies every pending removal, clears the bus and
    /// waits for the observers to see the last event. Later calls return
    /// immediately.
    pub async fn shutdown(&self) {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        self.scheduler.dispose_all(|name| {
            tracing::debug!(system = name, "disposed");
            self.lifecycle
                .publish(Event::new(EventKind::SystemDisposed).with_system(name));
        });
        let _ = self.bus.unsubscribe(LATE_TICK_REGISTER, &self.registrar);
        let applied = self.bus.flush();
        self.bus.clear();
        self.orchestrator.stop();

        tracing::info!(removals = applied, "shutdown completed");
        self.lifecycle.publish(Event::new(EventKind::ShutdownCompleted));

        let relay = self
            .relay
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = relay {
            let _ = handle.await;
        }
    }
}

impl std::fmt::Debug for Shell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shell")
            .field("phase", &self.phase())
            .field("systems", &self.scheduler.len())
            .field("participants", &self.orchestrator.len())
            .field("registered_types", &self.registry.len())
            .field("bus", &self.bus)
            .finish()
    }
}
