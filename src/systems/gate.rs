//! # Readiness gate.
//!
//! One-shot latch owned by a single system: closed at construction, opened
//! once when that system's asynchronous setup completes, never closed again.

use std::sync::atomic::{AtomicBool, Ordering};

/// Binary readiness latch.
///
/// ### Rules
/// - Starts closed.
/// - [`open`](Self::open) is idempotent; only the first call transitions.
/// - There is no way to close it again.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
}

impl ReadinessGate {
    /// Creates a closed gate.
    pub const fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
        }
    }

    /// Opens the gate. Returns `true` if this call performed the transition.
    pub fn open(&self) -> bool {
        !self.ready.swap(true, Ordering::AcqRel)
    }

    /// Returns `true` once the gate has been opened.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_exactly_once() {
        let gate = ReadinessGate::new();
        assert!(!gate.is_open());
        assert!(gate.open());
        assert!(!gate.open());
        assert!(gate.is_open());
    }
}
