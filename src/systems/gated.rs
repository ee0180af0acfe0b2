//! # Gated game systems.
//!
//! [`Gated`] composes a [`ReadinessGate`] around an [`AsyncSystem`] so its tick
//! hooks stay silent until its own asynchronous setup has completed.
//!
//! ```text
//! orchestrator ──► Gated::setup() ──► S::setup().await ──► Ok ──► gate.open()
//!                                                      └─► Err ─► gate stays closed
//!
//! scheduler    ──► Gated::tick()  ──► gate closed? ──► return (dropped, not queued)
//!                                 └─► gate open   ──► S::tick()
//! ```
//!
//! The scheduler does not know a system is gated. A setup that fails or never
//! resolves leaves the tick hooks silent forever; the only trace is the
//! participant's lifecycle events.

use std::fmt;

use async_trait::async_trait;

use crate::error::SetupError;
use crate::systems::gate::ReadinessGate;
use crate::systems::participant::Participant;
use crate::systems::system::GameSystem;

/// # Game system with asynchronous setup.
///
/// Implement this, wrap it in [`Gated`], and register the wrapper with
/// [`ShellBuilder::with_async_system`](crate::ShellBuilder::with_async_system).
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use async_trait::async_trait;
/// use tickvisor::{AsyncSystem, GameSystem, Gated, Participant, SetupError};
///
/// #[derive(Default)]
/// struct Spawner {
///     ticks: AtomicU32,
/// }
///
/// #[async_trait]
/// impl AsyncSystem for Spawner {
///     fn name(&self) -> &str { "spawner" }
///
///     async fn setup(&self) -> Result<(), SetupError> { Ok(()) }
///
///     fn tick(&self) {
///         self.ticks.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let spawner = Gated::new(Spawner::default());
/// GameSystem::tick(&spawner); // dropped: not ready yet
/// Participant::setup(&spawner).await.unwrap();
/// GameSystem::tick(&spawner);
/// assert_eq!(spawner.inner().ticks.load(Ordering::Relaxed), 1);
/// # });
/// ```
#[async_trait]
pub trait AsyncSystem: Send + Sync + 'static {
    /// Returns a stable, human-readable system name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Asynchronous setup; the tick hooks run only after it returned `Ok`.
    async fn setup(&self) -> Result<(), SetupError>;

    /// Called once when the shell starts. Not gated.
    fn start(&self) {}

    /// Called once per frame after setup completed.
    fn tick(&self) {}

    /// Called once per frame after every tick, after setup completed.
    fn late_tick(&self) {}

    /// Called once during teardown. Not gated.
    fn dispose(&self) {}
}

/// An [`AsyncSystem`] behind its own [`ReadinessGate`].
///
/// Implements both [`GameSystem`] (for the scheduler) and [`Participant`]
/// (for the orchestrator). Only the participant side can open the gate.
pub struct Gated<S> {
    inner: S,
    gate: ReadinessGate,
}

impl<S: AsyncSystem> Gated<S> {
    /// Wraps `inner` behind a closed gate.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            gate: ReadinessGate::new(),
        }
    }

    /// Returns the wrapped system.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Returns `true` once setup has completed.
    pub fn is_ready(&self) -> bool {
        self.gate.is_open()
    }
}

impl<S: AsyncSystem> GameSystem for Gated<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn start(&self) {
        self.inner.start();
    }

    fn tick(&self) {
        if !self.gate.is_open() {
            return;
        }
        self.inner.tick();
    }

    fn late_tick(&self) {
        if !self.gate.is_open() {
            return;
        }
        self.inner.late_tick();
    }

    fn dispose(&self) {
        self.inner.dispose();
    }
}

#[async_trait]
impl<S: AsyncSystem> Participant for Gated<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn setup(&self) -> Result<(), SetupError> {
        self.inner.setup().await?;
        self.gate.open();
        Ok(())
    }
}

impl<S: AsyncSystem> fmt::Debug for Gated<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gated")
            .field("system", &self.inner.name())
            .field("ready", &self.gate.is_open())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct Probe {
        starts: AtomicU32,
        ticks: AtomicU32,
        late: AtomicU32,
        disposed: AtomicU32,
        release: Notify,
        fail: bool,
    }

    #[async_trait]
    impl AsyncSystem for Probe {
        fn name(&self) -> &str {
            "sensor"
        }

        async fn setup(&self) -> Result<(), SetupError> {
            self.release.notified().await;
            if self.fail {
                return Err(SetupError::fail("no assets"));
            }
            Ok(())
        }

        fn start(&self) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn tick(&self) {
            self.ticks.fetch_add(1, Ordering::SeqCst);
        }

        fn late_tick(&self) {
            self.late.fetch_add(1, Ordering::SeqCst);
        }

        fn dispose(&self) {
            self.disposed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn test_ticks_dropped_until_setup_completes() {
        let sys = std::sync::Arc::new(Gated::new(Probe::default()));

        let setup = {
            let sys = std::sync::Arc::clone(&sys);
            tokio::spawn(async move { Participant::setup(&*sys).await })
        };
        tokio::task::yield_now().await;

        GameSystem::tick(&*sys);
        GameSystem::late_tick(&*sys);
        assert_eq!(sys.inner().ticks.load(Ordering::SeqCst), 0);
        assert_eq!(sys.inner().late.load(Ordering::SeqCst), 0);
        assert!(!sys.is_ready());

        sys.inner().release.notify_one();
        setup.await.unwrap().unwrap();
        assert!(sys.is_ready());

        GameSystem::tick(&*sys);
        GameSystem::late_tick(&*sys);
        assert_eq!(sys.inner().ticks.load(Ordering::SeqCst), 1);
        assert_eq!(sys.inner().late.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_setup_keeps_gate_closed() {
        let sys = Gated::new(Probe {
            fail: true,
            ..Probe::default()
        });
        sys.inner().release.notify_one();
        assert!(Participant::setup(&sys).await.is_err());

        for _ in 0..3 {
            GameSystem::tick(&sys);
        }
        assert_eq!(sys.inner().ticks.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_start_and_dispose_not_gated() {
        let sys = Gated::new(Probe::default());
        GameSystem::start(&sys);
        GameSystem::dispose(&sys);
        assert_eq!(sys.inner().starts.load(Ordering::SeqCst), 1);
        assert_eq!(sys.inner().disposed.load(Ordering::SeqCst), 1);
        assert_eq!(GameSystem::name(&sys), "sensor");
    }
}
