//! # Lifecycle observers.
//!
//! Observers watch a shell start up and tear down. They never take part in
//! either: events reach them after the fact, on the shell's relay task.
//!
//! ```text
//! Orchestrator / Shell ── publish(Event) ──► LifecycleBus ──► Relay task
//!                                                               │
//!                                       ReadyTracker::update ◄──┤
//!                                                               └──► observer[0].on_event
//!                                                                    observer[1].on_event ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod observer;
mod relay;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use observer::Observe;
pub(crate) use relay::Relay;
