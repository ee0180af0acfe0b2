//! # Synchronous game-system hooks.
//!
//! A [`GameSystem`] is driven by the host through the shell:
//!
//! ```text
//! Shell::start()      ──► start()       (once, registration order)
//! Shell::tick()       ──► tick()        (every frame, registration order)
//! Shell::late_tick()  ──► late_tick()   (every frame, after all ticks)
//! Shell::shutdown()   ──► dispose()     (once, reverse registration order)
//! ```
//!
//! Hooks are synchronous and never suspend. They take `&self`; systems keep
//! their mutable state behind their own interior mutability.

use std::sync::Arc;

/// Shared handle to a registered game system.
pub type SystemRef = Arc<dyn GameSystem>;

/// Shared handle to a late-tick component, the payload of
/// [`LATE_TICK_REGISTER`](crate::LATE_TICK_REGISTER).
pub type LateTickRef = Arc<dyn LateTick>;

/// # Per-frame unit of game logic.
///
/// Every hook defaults to a no-op, so a system only overrides what it needs.
///
/// # Example
/// ```
/// use std::sync::atomic::{AtomicU64, Ordering};
/// use tickvisor::GameSystem;
///
/// #[derive(Default)]
/// struct Clock {
///     frames: AtomicU64,
/// }
///
/// impl GameSystem for Clock {
///     fn name(&self) -> &str { "clock" }
///
///     fn tick(&self) {
///         self.frames.fetch_add(1, Ordering::Relaxed);
///     }
/// }
///
/// let clock = Clock::default();
/// clock.tick();
/// assert_eq!(clock.frames.load(Ordering::Relaxed), 1);
/// ```
pub trait GameSystem: Send + Sync + 'static {
    /// Returns a stable, human-readable system name.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once when the shell starts, before any asynchronous setup is awaited.
    fn start(&self) {}

    /// Called once per frame.
    fn tick(&self) {}

    /// Called once per frame, after every system's [`tick`](GameSystem::tick).
    fn late_tick(&self) {}

    /// Called once during the shell's teardown.
    ///
    /// Unsubscribing here is safe: removals are applied by the teardown itself.
    fn dispose(&self) {}
}

/// A component that is not a registered system but still wants a per-frame
/// `late_tick`.
///
/// Components enlist themselves at runtime by publishing a [`LateTickRef`]
/// on [`LATE_TICK_REGISTER`](crate::LATE_TICK_REGISTER). The shell keeps
/// them until teardown; publishing the same handle twice enlists it once.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use tickvisor::{Config, LATE_TICK_REGISTER, LateTick, LateTickRef, Shell};
///
/// struct Camera;
///
/// impl LateTick for Camera {
///     fn late_tick(&self) {
///         // follow the player after everything moved
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let shell = Shell::builder(Config::default()).build();
/// let camera: LateTickRef = Arc::new(Camera);
/// shell.bus().publish_with(LATE_TICK_REGISTER, camera)?;
/// assert_eq!(shell.scheduler().late_components(), 1);
/// # shell.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub trait LateTick: Send + Sync + 'static {
    /// Called once per frame, after every system's [`GameSystem::late_tick`].
    fn late_tick(&self);
}
