//! # Participant readiness tracker with sequence-based ordering.
//!
//! Maintains the authoritative setup state of every participant, using event
//! sequence numbers to handle out-of-order delivery.
//!
//! ## Architecture
//! ```text
//! Orchestrator ──► LifecycleBus ──► relay task ──► ReadyTracker::update()
//!                                                        │
//!                                                        ▼
//!                                             HashMap<String, SetupRecord>
//!                                                (name → {seq, state})
//! ```
//!
//! ## Rules
//! - Only `SetupStarting` / `SetupCompleted` / `SetupFailed` change state
//! - Events with `seq <= last_seq` are **rejected** (stale)
//! - Reads are **eventually consistent** with the orchestrator

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

/// Setup state of a single participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetupState {
    /// Setup began and has not finished.
    Pending,
    /// Setup completed.
    Ready,
    /// Setup returned an error.
    Failed,
}

#[derive(Debug, Clone)]
struct SetupRecord {
    last_seq: u64,
    state: SetupState,
}

/// Thread-safe tracker of participant setup state.
///
/// Answers "who is the startup waiting on" through [`stalled`](Self::stalled):
/// a participant whose setup never completes stays `Pending` forever, which
/// is the only visible trace of a starved gated system.
#[derive(Debug, Default)]
pub struct ReadyTracker {
    state: RwLock<HashMap<String, SetupRecord>>,
}

impl ReadyTracker {
    /// Creates a new empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies an event if it is newer than the last one seen for its system.
    ///
    /// Returns `true` when the event changed the recorded state.
    pub async fn update(&self, ev: &Event) -> bool {
        let next = match ev.kind {
            EventKind::SetupStarting => SetupState::Pending,
            EventKind::SetupCompleted => SetupState::Ready,
            EventKind::SetupFailed => SetupState::Failed,
            _ => return false,
        };
        let Some(name) = ev.system.as_deref() else {
            return false;
        };

        let mut state = self.state.write().await;
        let entry = state.entry(name.to_string()).or_insert(SetupRecord {
            last_seq: 0,
            state: SetupState::Pending,
        });
        if ev.seq <= entry.last_seq {
            return false;
        }
        entry.last_seq = ev.seq;
        entry.state = next;
        true
    }

    /// Returns the recorded state of `name`, if its setup ever started.
    pub async fn state(&self, name: &str) -> Option<SetupState> {
        self.state.read().await.get(name).map(|r| r.state)
    }

    /// Returns true if `name` completed its setup.
    pub async fn is_ready(&self, name: &str) -> bool {
        self.state(name).await == Some(SetupState::Ready)
    }

    /// Returns the sorted names of participants whose setup started but never finished.
    pub async fn stalled(&self) -> Vec<String> {
        self.collect(SetupState::Pending).await
    }

    /// Returns the sorted names of participants whose setup failed.
    pub async fn failed(&self) -> Vec<String> {
        self.collect(SetupState::Failed).await
    }

    async fn collect(&self, wanted: SetupState) -> Vec<String> {
        let state = self.state.read().await;
        let mut out: Vec<String> = state
            .iter()
            .filter(|(_, r)| r.state == wanted)
            .map(|(name, _)| name.clone())
            .collect();
        out.sort_unstable();
        out
    }
}
