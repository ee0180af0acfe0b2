use std::sync::Arc;

use super::{
    config::Config,
    orchestrator::StartupOrchestrator,
    ready::ReadyTracker,
    registry::Registry,
    scheduler::{LATE_TICK_REGISTER, TickScheduler},
    shell::Shell,
};
use crate::{
    events::LifecycleBus,
    observers::{Observe, Relay},
    systems::{GameSystem, Participant, ParticipantRef, SystemRef},
    topics::EventBus,
};

/// Builder for constructing a [`Shell`] from an explicit, ordered registration.
///
/// Registration order is the contract: systems tick in the order they were
/// added, participants are set up in the order they were added.
pub struct ShellBuilder {
    cfg: Config,
    bus: EventBus,
    observers: Vec<Arc<dyn Observe>>,
    systems: Vec<SystemRef>,
    participants: Vec<ParticipantRef>,
    registry: Registry,
}

impl ShellBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        let bus = EventBus::with_delay(cfg.removal_delay_clamped());
        Self {
            cfg,
            bus,
            observers: Vec::new(),
            systems: Vec::new(),
            participants: Vec::new(),
            registry: Registry::new(),
        }
    }

    /// Returns the event bus the shell will own, so systems can capture it at construction.
    pub fn bus(&self) -> EventBus {
        self.bus.clone()
    }

    /// Sets lifecycle observers, called in the given order for every event.
    pub fn with_observers(mut self, observers: Vec<Arc<dyn Observe>>) -> Self {
        self.observers = observers;
        self
    }

    /// Registers a synchronous system with the scheduler.
    pub fn with_system<T: GameSystem>(mut self, system: Arc<T>) -> Self {
        self.registry.insert(Arc::clone(&system));
        self.systems.push(system);
        self
    }

    /// Appends a participant to the startup queue.
    pub fn with_participant<T: Participant>(mut self, participant: Arc<T>) -> Self {
        self.registry.insert(Arc::clone(&participant));
        self.participants.push(participant);
        self
    }

    /// Registers a system that is both ticked and set up, usually a [`Gated`](crate::Gated).
    pub fn with_async_system<T: GameSystem + Participant>(mut self, system: Arc<T>) -> Self {
        self.registry.insert(Arc::clone(&system));
        self.systems.push(Arc::clone(&system) as SystemRef);
        self.participants.push(system);
        self
    }

    /// Builds the shell, spawns its lifecycle relay and subscribes the
    /// scheduler to [`LATE_TICK_REGISTER`].
    ///
    /// Must be called from within a tokio runtime.
    pub fn build(self) -> Arc<Shell> {
        let lifecycle = LifecycleBus::new(self.cfg.bus_capacity_clamped());
        let tracker = Arc::new(ReadyTracker::new());

        tracing::debug!(
            systems = self.systems.len(),
            participants = self.participants.len(),
            observers = self.observers.len(),
            "building shell"
        );

        let relay = Relay::new(self.observers, Arc::clone(&tracker)).spawn(lifecycle.subscribe());
        let scheduler = TickScheduler::new(self.systems.into(), self.bus.clone());
        let registrar = scheduler.registrar();
        if let Err(err) = self.bus.subscribe(LATE_TICK_REGISTER, &registrar) {
            tracing::error!(error = %err, "late-tick registration unavailable");
        }
        let orchestrator = StartupOrchestrator::with_bus(self.participants.into(), lifecycle.clone());

        Arc::new(Shell::new_internal(
            self.cfg,
            self.bus,
            lifecycle,
            scheduler,
            registrar,
            orchestrator,
            self.registry,
            tracker,
            relay,
        ))
    }
}
