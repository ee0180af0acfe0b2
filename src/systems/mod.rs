//! # Game-system contracts.
//!
//! - [`GameSystem`] synchronous hooks driven by the host every frame
//! - [`Participant`] asynchronous setup awaited by the orchestrator
//! - [`AsyncSystem`] + [`Gated`] a system whose ticks wait for its own setup
//! - [`ReadinessGate`] the one-shot latch behind [`Gated`]
//! - [`SetupFn`] closure-backed participant
//! - [`LateTick`] component enlisted for late ticks through the bus

mod gate;
mod gated;
mod participant;
mod setup_fn;
mod system;

pub use gate::ReadinessGate;
pub use gated::{AsyncSystem, Gated};
pub use participant::{Participant, ParticipantRef};
pub use setup_fn::SetupFn;
pub use system::{GameSystem, LateTick, LateTickRef, SystemRef};
