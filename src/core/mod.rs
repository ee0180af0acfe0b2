//! Shell core: ownership, startup and frame scheduling.
//!
//! The public entry point is [`Shell`], built through [`ShellBuilder`].
//!
//! Internal modules:
//! - [`builder`]: ordered registration, spawns the lifecycle relay;
//! - [`shell`]: owning scope, start and teardown;
//! - [`orchestrator`]: serial participant setup and startup phase;
//! - [`scheduler`]: per-frame hooks, bus quanta and late-tick enlistment;
//! - [`ready`]: sequence-ordered participant readiness;
//! - [`registry`]: typed lookup of registered systems;
//! - [`config`]: shell settings.

mod builder;
mod config;
mod orchestrator;
mod ready;
mod registry;
mod scheduler;
mod shell;

pub use builder::ShellBuilder;
pub use config::Config;
pub use orchestrator::{Phase, StartupOrchestrator};
pub use ready::{ReadyTracker, SetupState};
pub use scheduler::{LATE_TICK_REGISTER, TickScheduler};
pub use shell::Shell;
