//! # Topic identifiers.
//!
//! A [`Topic`] names a class of occurrence on the [`EventBus`](crate::EventBus).
//! It is validated once at construction and cheap to clone afterwards.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

use crate::error::BusError;

/// Immutable, validated topic name.
///
/// ### Rules
/// - Non-empty and not whitespace-only.
/// - Compared and hashed by its string content.
///
/// # Example
/// ```
/// use tickvisor::Topic;
///
/// let t = Topic::new("player.died").unwrap();
/// assert_eq!(t.as_str(), "player.died");
/// assert!(Topic::new("   ").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(Arc<str>);

impl Topic {
    /// Validates and creates a topic.
    pub fn new(name: impl AsRef<str>) -> Result<Self, BusError> {
        let name = name.as_ref();
        if !Self::is_valid(name) {
            return Err(BusError::InvalidTopic {
                topic: name.to_string(),
            });
        }
        Ok(Self(Arc::from(name)))
    }

    /// Returns `true` if `name` can be used as a topic.
    #[inline]
    pub fn is_valid(name: &str) -> bool {
        !name.trim().is_empty()
    }

    /// Returns the topic name.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Topic {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_blank() {
        for bad in ["", " ", "\t\n"] {
            let err = Topic::new(bad).unwrap_err();
            assert_eq!(err.as_label(), "bus_invalid_topic");
        }
    }

    #[test]
    fn test_borrows_as_str_for_lookup() {
        let mut set = std::collections::HashSet::new();
        set.insert(Topic::new("late_update_register").unwrap());
        assert!(set.contains("late_update_register"));
    }
}
