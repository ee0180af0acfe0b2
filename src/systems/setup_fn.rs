//! # Function-backed participant (`SetupFn`)
//!
//! [`SetupFn`] wraps a closure `F: Fn() -> Fut`, producing a fresh future per
//! setup call. Useful for one-off participants that own no tick hooks, such
//! as a "load the main scene" step at the end of the startup queue.
//!
//! ## Example
//! ```rust
//! use tickvisor::{Participant, ParticipantRef, SetupError, SetupFn};
//!
//! let scene: ParticipantRef = SetupFn::arc("scene-loader", || async {
//!     // await the scene collaborator...
//!     Ok::<_, SetupError>(())
//! });
//!
//! assert_eq!(scene.name(), "scene-loader");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SetupError;
use crate::systems::participant::Participant;

/// Function-backed participant implementation.
pub struct SetupFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> SetupFn<F> {
    /// Creates a new function-backed participant.
    ///
    /// Prefer [`SetupFn::arc`] when you immediately need a [`ParticipantRef`](crate::ParticipantRef).
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the participant and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> Participant for SetupFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SetupError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn setup(&self) -> Result<(), SetupError> {
        (self.f)().await
    }
}

impl<F> std::fmt::Debug for SetupFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetupFn").field("name", &self.name).finish()
    }
}
