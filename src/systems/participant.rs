//! # Startup participants.
//!
//! A [`Participant`] declares asynchronous setup that the
//! [`StartupOrchestrator`](crate::StartupOrchestrator) must await before the
//! next participant begins. Participants are awaited strictly in registration
//! order, so a participant may assume every earlier one is already set up.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SetupError;

/// Shared handle to a startup participant.
pub type ParticipantRef = Arc<dyn Participant>;

/// # Asynchronous "begin setup, resolve when ready" entry point.
///
/// There is no cancellation and no timeout: the orchestrator awaits `setup`
/// until it resolves. A setup that never resolves stalls every later participant.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use tickvisor::{Participant, SetupError};
///
/// struct Warmup;
///
/// #[async_trait]
/// impl Participant for Warmup {
///     fn name(&self) -> &str { "warmup" }
///
///     async fn setup(&self) -> Result<(), SetupError> {
///         tokio::task::yield_now().await;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Participant: Send + Sync + 'static {
    /// Returns a stable, human-readable participant name.
    fn name(&self) -> &str;

    /// Runs the participant's asynchronous setup to completion.
    async fn setup(&self) -> Result<(), SetupError>;
}
