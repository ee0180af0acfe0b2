//! # tickvisor
//!
//! **Tickvisor** is a small application shell for frame-driven programs such as
//! games: a topic-keyed event bus with deferred unsubscription, systems whose
//! per-frame hooks stay silent until their own asynchronous setup completes,
//! and a startup orchestrator that awaits every setup strictly one after
//! another.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!  ShellBuilder (explicit, ordered registration)
//!     │  with_participant(ResourceStore)   with_async_system(Gated<S>)   with_system(S)
//!     ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Shell                                                            │
//! │  - EventBus           (topic → callbacks, deferred removal)       │
//! │  - TickScheduler      (start / tick / late_tick / dispose)        │
//! │  - StartupOrchestrator(serial async setup, phase)                 │
//! │  - Registry           (get::<T>())                                │
//! └──────┬──────────────────────────┬─────────────────────────────────┘
//!        │ host frames              │ start().await
//!        ▼                          ▼
//!   tick():                      for p in participants (in order):
//!     bus.advance()                p.setup().await ──► Err ─► stop, return SetupFailed
//!     sys.tick() ...                       └──► Ok  ─► Gated gate opens
//!   late_tick():
//!     sys.late_tick() ...
//!     c.late_tick() ...          (c enlisted via publish_with(LATE_TICK_REGISTER, c))
//!
//!  lifecycle events ──► LifecycleBus ──► relay task ──► ReadyTracker, then each observer
//! ```
//!
//! ### Bus timing
//! ```text
//! quantum n:    unsubscribe(t, cb)   ─► pending(due = n + delay)
//!               publish(t)           ─► cb still invoked (stale delivery)
//! quantum n+1:  tick() ─► advance()  ─► cb removed; topic dropped if empty
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / traits                          |
//! |-------------------|---------------------------------------------------------------|---------------------------------------------|
//! | **Event bus**     | Named topics with 0/1/2 typed payloads, deferred removal.     | [`EventBus`], [`Callback0`], [`Callback1`]  |
//! | **Systems**       | Frame hooks, asynchronous setup, readiness gating.            | [`GameSystem`], [`AsyncSystem`], [`Gated`]  |
//! | **Late ticks**    | Components enlisted at runtime through the bus.               | [`LateTick`], [`LATE_TICK_REGISTER`]        |
//! | **Startup**       | Strictly serial setup with fail-stop semantics.               | [`StartupOrchestrator`], [`Participant`]    |
//! | **Shell**         | Ownership, typed lookup, explicit teardown.                   | [`Shell`], [`ShellBuilder`]                 |
//! | **Resources**     | Typed values loaded once during startup.                      | [`ResourceStore`], [`Resource`]             |
//! | **Observers**     | Hook into startup/teardown events.                            | [`Observe`], [`ReadyTracker`]               |
//! | **Errors**        | Typed errors for the bus, setups and startup.                 | [`BusError`], [`SetupError`], [`StartupError`] |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use tickvisor::{Callback1, Config, SetupError, SetupFn, Shell};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = Shell::builder(Config::default());
//!     let bus = builder.bus();
//!
//!     let on_score = Callback1::new(|points: &u32| {
//!         println!("scored {points}");
//!         Ok(())
//!     });
//!     bus.subscribe("score", &on_score)?;
//!
//!     let shell = builder
//!         .with_participant(SetupFn::arc("scene", || async { Ok::<_, SetupError>(()) }))
//!         .build();
//!
//!     shell.start().await?;
//!     shell.frame();
//!     bus.publish_with("score", 10u32)?;
//!
//!     shell.shutdown().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod observers;
mod resources;
mod systems;
mod topics;

// ---- Public re-exports ----

pub use core::{
    Config, LATE_TICK_REGISTER, Phase, ReadyTracker, SetupState, Shell, ShellBuilder,
    StartupOrchestrator, TickScheduler,
};
pub use error::{BusError, HandlerError, HandlerResult, SetupError, StartupError};
pub use events::{Event, EventKind};
pub use observers::Observe;
pub use resources::{Resource, ResourceStore};
pub use systems::{
    AsyncSystem, GameSystem, Gated, LateTick, LateTickRef, Participant, ParticipantRef,
    ReadinessGate, SetupFn, SystemRef,
};
pub use topics::{Callback0, Callback1, Callback2, EventBus, Listener, Removal, Topic};

// Optional: expose a simple built-in logger observer (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use observers::LogWriter;
