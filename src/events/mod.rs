//! Lifecycle events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the startup orchestrator
//! and the shell's teardown.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`LifecycleBus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `StartupOrchestrator`, `Shell::shutdown`.
//! - **Consumer**: the shell's relay task (updates `ReadyTracker`, then calls each observer).

mod bus;
mod event;

pub use bus::LifecycleBus;
pub use event::{Event, EventKind};
