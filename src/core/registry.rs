//! # Typed system registry.
//!
//! Replaces global static lookup with a lookup owned by the shell. Every
//! registered system or participant is indexed by its concrete type; the first
//! registration of a type wins and later ones are only reachable through the
//! scheduler or orchestrator.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

type Entry = Arc<dyn Any + Send + Sync>;

/// Lookup table from concrete type to shared instance.
#[derive(Default)]
pub(crate) struct Registry {
    by_type: HashMap<TypeId, Entry>,
}

impl Registry {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Indexes `value` under `T`. Returns `false` if `T` was already registered.
    pub(crate) fn insert<T: Send + Sync + 'static>(&mut self, value: Arc<T>) -> bool {
        let id = TypeId::of::<T>();
        if self.by_type.contains_key(&id) {
            tracing::debug!(ty = std::any::type_name::<T>(), "type already registered; keeping first");
            return false;
        }
        self.by_type.insert(id, value);
        true
    }

    pub(crate) fn get<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        self.by_type
            .get(&TypeId::of::<T>())
            .and_then(|e| Arc::clone(e).downcast::<T>().ok())
    }

    pub(crate) fn len(&self) -> usize {
        self.by_type.len()
    }
}
