//! # Serial startup orchestration.
//!
//! [`StartupOrchestrator`] awaits each participant's asynchronous setup to
//! completion before starting the next one, in registration order.
//!
//! ## Phases
//! ```text
//! Idle ──begin()──► Starting ──drive()──┬──► Live
//!                                       └──► Failed   (setup error at position k)
//! any ──shutdown──► Stopped
//! ```
//!
//! ## Rules
//! - Strict serialization: setup *k+1* begins only after setup *k* resolved.
//! - A failure at position *k* abandons the sequence: *k+1..n* never begin.
//! - No rollback: participants that completed stay ready.
//! - Startup is claimed once; a second claim fails with [`StartupError::AlreadyStarted`].
//!
//! ## Events
//! ```text
//! for each participant:
//!   SetupStarting{system, position}
//!   ├─ Ok  ─► SetupCompleted{system, position, elapsed}
//!   └─ Err ─► SetupFailed{system, position, reason} ─► return Err
//! StartupCompleted{elapsed}
//! ```

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::watch;

use crate::error::StartupError;
use crate::events::{Event, EventKind, LifecycleBus};
use crate::systems::ParticipantRef;

/// Startup phase of a shell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing has been claimed yet.
    Idle,
    /// Setups are being awaited.
    Starting,
    /// Every participant completed its setup.
    Live,
    /// A participant's setup failed; later participants never ran.
    Failed,
    /// The shell was torn down.
    Stopped,
}

impl Phase {
    /// True once startup reached a final outcome.
    #[inline]
    pub fn is_settled(self) -> bool {
        matches!(self, Phase::Live | Phase::Failed | Phase::Stopped)
    }
}

/// Awaits participants one after another.
pub struct StartupOrchestrator {
    participants: Arc<[ParticipantRef]>,
    bus: LifecycleBus,
    phase: watch::Sender<Phase>,
}

impl StartupOrchestrator {
    /// Creates an orchestrator over `participants`, in the given order.
    ///
    /// Lifecycle events are published on a private channel nobody observes;
    /// a [`Shell`](crate::Shell) wires them to its observers instead.
    pub fn new(participants: Arc<[ParticipantRef]>) -> Self {
        Self::with_bus(participants, LifecycleBus::new(16))
    }

    pub(crate) fn with_bus(participants: Arc<[ParticipantRef]>, bus: LifecycleBus) -> Self {
        let (phase, _rx) = watch::channel(Phase::Idle);
        Self {
            participants,
            bus,
            phase,
        }
    }

    /// Number of participants in the startup queue.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// True when the startup queue is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Claims startup and awaits every participant.
    pub async fn run(&self) -> Result<(), StartupError> {
        self.begin()?;
        self.drive().await
    }

    /// Moves `Idle → Starting`. Fails if startup was already claimed.
    pub(crate) fn begin(&self) -> Result<(), StartupError> {
        let mut claimed = false;
        self.phase.send_if_modified(|p| {
            if *p == Phase::Idle {
                *p = Phase::Starting;
                claimed = true;
            }
            claimed
        });
        if claimed {
            Ok(())
        } else {
            Err(StartupError::AlreadyStarted)
        }
    }

    /// Awaits every participant in order. Must follow a successful [`begin`](Self::begin).
    pub(crate) async fn drive(&self) -> Result<(), StartupError> {
        let started = Instant::now();

        for (position, participant) in self.participants.iter().enumerate() {
            let name = participant.name();
            tracing::info!(system = name, position, "setup starting");
            self.bus.publish(
                Event::new(EventKind::SetupStarting)
                    .with_system(name)
                    .with_position(position),
            );

            let t0 = Instant::now();
            if let Err(source) = participant.setup().await {
                tracing::error!(system = name, position, error = %source, "setup failed");
                self.bus.publish(
                    Event::new(EventKind::SetupFailed)
                        .with_system(name)
                        .with_position(position)
                        .with_reason(source.to_string()),
                );
                self.settle(Phase::Failed);
                return Err(StartupError::SetupFailed {
                    system: name.to_string(),
                    position,
                    source,
                });
            }

            let elapsed = t0.elapsed();
            tracing::info!(system = name, position, ?elapsed, "setup completed");
            self.bus.publish(
                Event::new(EventKind::SetupCompleted)
                    .with_system(name)
                    .with_position(position)
                    .with_elapsed(elapsed),
            );
        }

        let elapsed = started.elapsed();
        tracing::info!(participants = self.participants.len(), ?elapsed, "startup completed");
        self.bus
            .publish(Event::new(EventKind::StartupCompleted).with_elapsed(elapsed));
        self.settle(Phase::Live);
        Ok(())
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.phase.borrow()
    }

    /// True once every participant completed its setup.
    pub fn is_live(&self) -> bool {
        self.phase() == Phase::Live
    }

    /// Waits until startup settles (`Live`, `Failed` or `Stopped`) and returns that phase.
    ///
    /// Never resolves while a setup is stuck.
    pub async fn wait_settled(&self) -> Phase {
        let mut rx = self.phase.subscribe();
        match rx.wait_for(|p| p.is_settled()).await {
            Ok(p) => *p,
            Err(_) => self.phase(),
        }
    }

    /// Moves to `Stopped`; used by the shell's teardown.
    pub(crate) fn stop(&self) {
        self.phase.send_replace(Phase::Stopped);
    }

    // `Stopped` is final: a setup resolving after teardown does not revive the phase.
    fn settle(&self, phase: Phase) {
        self.phase.send_if_modified(|p| {
            if *p == Phase::Stopped {
                return false;
            }
            *p = phase;
            true
        });
    }
}

impl std::fmt::Debug for StartupOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StartupOrchestrator")
            .field("participants", &self.participants.len())
            .field("phase", &self.phase())
            .finish()
    }
}
