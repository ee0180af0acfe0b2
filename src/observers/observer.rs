use async_trait::async_trait;

use crate::events::Event;

/// Observer of a shell's lifecycle events.
///
/// Observers run one after another on the shell's relay task, in the order
/// they were registered, and see every event in sequence order. A slow
/// observer delays the ones after it but never the orchestrator or the frame
/// loop. A panic is logged and skips that observer for that event only.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use tickvisor::{Event, EventKind, Observe};
///
/// struct Splash;
///
/// #[async_trait]
/// impl Observe for Splash {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::StartupCompleted {
///             // hide the loading screen
///         }
///     }
///
///     fn name(&self) -> &str { "splash" }
/// }
/// ```
#[async_trait]
pub trait Observe: Send + Sync + 'static {
    /// Handles one lifecycle event.
    async fn on_event(&self, event: &Event);

    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }
}
