//! # LogWriter: lifecycle printer for demos.
//!
//! ```text
//! #12 setup     resources [0]
//! #13 ready     resources [0] in 12ms
//! #14 setup     debug-console [1]
//! #15 failed    debug-console [1]: missing dependency: keymap
//! #16 disposed  debug-console
//! #17 shutdown
//! ```

use std::fmt::Write as _;

use async_trait::async_trait;

use super::Observe;
use crate::events::{Event, EventKind};

/// Prints every lifecycle event on one line to stdout.
#[derive(Debug, Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn render(ev: &Event) -> String {
    let tag = match ev.kind {
        EventKind::SetupStarting => "setup",
        EventKind::SetupCompleted => "ready",
        EventKind::SetupFailed => "failed",
        EventKind::StartupCompleted => "live",
        EventKind::SystemDisposed => "disposed",
        EventKind::ShutdownCompleted => "shutdown",
    };
    let mut line = format!("#{} {tag:<9}", ev.seq);
    if let Some(system) = ev.system.as_deref() {
        let _ = write!(line, " {system}");
    }
    if let Some(position) = ev.position {
        let _ = write!(line, " [{position}]");
    }
    if let Some(ms) = ev.elapsed_ms {
        let _ = write!(line, " in {ms}ms");
    }
    if let Some(reason) = ev.reason.as_deref() {
        let _ = write!(line, ": {reason}");
    }
    line.trim_end().to_string()
}

#[async_trait]
impl Observe for LogWriter {
    async fn on_event(&self, ev: &Event) {
        println!("{}", render(ev));
    }

    fn name(&self) -> &str {
        "log-writer"
    }
}
