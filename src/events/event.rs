//! # Lifecycle events emitted by the shell and the startup orchestrator.
//!
//! The [`EventKind`] enum classifies event types in two groups:
//! - **Startup events**: participant setup flow (starting, completed, failed, all ready)
//! - **Teardown events**: system disposal and shutdown completion
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! system name, its registration position and setup duration.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tickvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::SetupFailed)
//!     .with_system("resources")
//!     .with_position(0)
//!     .with_reason("bundle missing");
//!
//! assert_eq!(ev.kind, EventKind::SetupFailed);
//! assert_eq!(ev.system.as_deref(), Some("resources"));
//! assert_eq!(ev.reason.as_deref(), Some("bundle missing"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(1);

/// Classification of lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Startup events ===
    /// A participant's asynchronous setup is about to begin.
    ///
    /// Sets:
    /// - `system`: participant name
    /// - `position`: zero-based registration position
    SetupStarting,

    /// A participant's setup completed; it is ready.
    ///
    /// Sets:
    /// - `system`: participant name
    /// - `position`: zero-based registration position
    /// - `elapsed_ms`: setup duration
    SetupCompleted,

    /// A participant's setup failed; the remaining sequence is abandoned.
    ///
    /// Sets:
    /// - `system`: participant name
    /// - `position`: zero-based registration position
    /// - `reason`: failure message
    SetupFailed,

    /// Every participant completed setup; the shell is live.
    ///
    /// Sets:
    /// - `elapsed_ms`: total startup duration
    StartupCompleted,

    // === Teardown events ===
    /// A system's `dispose` hook ran.
    ///
    /// Sets:
    /// - `system`: system name
    SystemDisposed,

    /// Teardown finished: systems disposed, removals applied, bus cleared.
    ///
    /// Always the last event of a shell.
    ShutdownCompleted,
}

/// Lifecycle event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Debug, Clone)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the system, if applicable.
    pub system: Option<Arc<str>>,
    /// Registration position of the participant.
    pub position: Option<u32>,
    /// Duration in milliseconds (compact).
    pub elapsed_ms: Option<u32>,
    /// Human-readable failure reason.
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            system: None,
            position: None,
            elapsed_ms: None,
            reason: None,
        }
    }

    /// Attaches a system name.
    #[inline]
    pub fn with_system(mut self, system: impl Into<Arc<str>>) -> Self {
        self.system = Some(system.into());
        self
    }

    /// Attaches a registration position.
    #[inline]
    pub fn with_position(mut self, position: usize) -> Self {
        self.position = Some(u32::try_from(position).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a duration (stored as milliseconds).
    #[inline]
    pub fn with_elapsed(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.elapsed_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// True for the last event a shell ever publishes.
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, EventKind::ShutdownCompleted)
    }
}
