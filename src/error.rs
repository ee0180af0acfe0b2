//! Error types used by the event bus, game systems and the startup orchestrator.
//!
//! This module defines the error enums surfaced to callers:
//!
//! - [`BusError`]: argument validation and callback failures on the [`EventBus`](crate::EventBus).
//! - [`HandlerError`]: the error value a subscriber callback returns.
//! - [`SetupError`]: a startup participant failed its asynchronous setup.
//! - [`StartupError`]: the orchestration sequence itself failed.
//!
//! The enums provide helper methods (`as_label`, `as_message`) for logs/metrics.

use thiserror::Error;

/// Result type returned by subscriber callbacks.
pub type HandlerResult = Result<(), HandlerError>;

/// # Error returned by a subscriber callback.
///
/// The bus never isolates it: the first failing callback aborts the
/// remaining deliveries of that publish and surfaces as [`BusError::HandlerFailed`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Creates a handler error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// # Errors produced by the event bus.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BusError {
    /// Topic is empty or consists only of whitespace.
    #[error("invalid topic {topic:?}: must be non-empty and not whitespace")]
    InvalidTopic {
        /// The rejected topic string.
        topic: String,
    },

    /// A subscriber callback failed; remaining subscribers of this publish were skipped.
    #[error("subscriber on topic {topic:?} failed: {source}")]
    HandlerFailed {
        /// Topic being published.
        topic: String,
        /// Error returned by the callback.
        #[source]
        source: HandlerError,
    },
}

impl BusError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::BusError;
    ///
    /// let err = BusError::InvalidTopic { topic: " ".into() };
    /// assert_eq!(err.as_label(), "bus_invalid_topic");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            BusError::InvalidTopic { .. } => "bus_invalid_topic",
            BusError::HandlerFailed { .. } => "bus_handler_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            BusError::InvalidTopic { topic } => format!("invalid topic: {topic:?}"),
            BusError::HandlerFailed { topic, source } => {
                format!("handler failed: topic={topic:?} error={source}")
            }
        }
    }
}

/// # Errors produced by a participant's asynchronous setup.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SetupError {
    /// Setup failed.
    #[error("setup failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// A dependency expected to be ready was not available.
    #[error("missing dependency: {dependency}")]
    Missing {
        /// Name of the missing resource or system.
        dependency: String,
    },

    /// An event bus call made during setup failed.
    #[error(transparent)]
    Bus(#[from] BusError),
}

impl SetupError {
    /// Shorthand for [`SetupError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        SetupError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            SetupError::Fail { .. } => "setup_failed",
            SetupError::Missing { .. } => "setup_missing_dependency",
            SetupError::Bus(_) => "setup_bus_error",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            SetupError::Fail { error } => format!("error: {error}"),
            SetupError::Missing { dependency } => format!("missing: {dependency}"),
            SetupError::Bus(e) => e.as_message(),
        }
    }
}

/// # Errors produced by the startup orchestration.
///
/// Returned to the host; the sequence is never retried and systems that
/// already finished setup stay started.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StartupError {
    /// Startup was already claimed; there is no path back to "not started".
    #[error("startup already began")]
    AlreadyStarted,

    /// The participant at `position` failed; later participants never ran.
    #[error("setup of {system:?} (position {position}) failed: {source}")]
    SetupFailed {
        /// Participant name.
        system: String,
        /// Zero-based registration position.
        position: usize,
        /// The participant's error.
        #[source]
        source: SetupError,
    },
}

impl StartupError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use tickvisor::StartupError;
    ///
    /// assert_eq!(StartupError::AlreadyStarted.as_label(), "startup_already_started");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StartupError::AlreadyStarted => "startup_already_started",
            StartupError::SetupFailed { .. } => "startup_setup_failed",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            StartupError::AlreadyStarted => "startup already began".to_string(),
            StartupError::SetupFailed {
                system,
                position,
                source,
            } => format!("system={system} position={position} {}", source.as_message()),
        }
    }
}

/// Extracts the message of a caught panic payload.
pub(crate) fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&'static str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_failed_keeps_source() {
        let err = BusError::HandlerFailed {
            topic: "score".into(),
            source: HandlerError::new("boom"),
        };
        assert_eq!(err.as_label(), "bus_handler_failed");
        assert!(err.to_string().contains("boom"));
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("boom"));
    }

    #[test]
    fn test_setup_error_from_bus() {
        let err: SetupError = BusError::InvalidTopic { topic: "".into() }.into();
        assert_eq!(err.as_label(), "setup_bus_error");
    }

    #[test]
    fn test_startup_message_names_position() {
        let err = StartupError::SetupFailed {
            system: "resources".into(),
            position: 2,
            source: SetupError::fail("disk"),
        };
        assert_eq!(err.as_message(), "system=resources position=2 error: disk");
    }
}
