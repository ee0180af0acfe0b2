//! # Typed resource store.
//!
//! [`ResourceStore`] loads every registered [`Resource`] once during startup and
//! serves them by type afterwards. It is a regular [`Participant`], usually
//! registered first so that later systems can read resources in their own
//! setup.
//!
//! ## Rules
//! - Resources load sequentially, in registration order.
//! - A failing loader is logged and skipped; the store still completes its setup.
//! - Registering the same type twice keeps the first registration.
//! - [`get`](ResourceStore::get) returns `None` for anything not (successfully) loaded.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use tickvisor::{Participant, Resource, ResourceStore, SetupError};
//!
//! struct Tuning { gravity: f32 }
//!
//! #[async_trait]
//! impl Resource for Tuning {
//!     async fn load() -> Result<Self, SetupError> {
//!         Ok(Tuning { gravity: 9.8 })
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let store = ResourceStore::new().with::<Tuning>();
//! store.setup().await.unwrap();
//! assert_eq!(store.get::<Tuning>().map(|t| t.gravity), Some(9.8));
//! # }
//! ```

use std::any::{Any, TypeId};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::error::SetupError;
use crate::systems::Participant;

type Loaded = Arc<dyn Any + Send + Sync>;
type Loader = Box<dyn Fn() -> BoxFuture<'static, Result<Loaded, SetupError>> + Send + Sync>;

/// A value loaded once during startup and shared read-only afterwards.
#[async_trait]
pub trait Resource: Sized + Send + Sync + 'static {
    /// Name used in logs.
    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Produces the resource.
    async fn load() -> Result<Self, SetupError>;
}

struct Slot {
    name: &'static str,
    ty: TypeId,
    load: Loader,
}

/// Loads registered resources during setup and serves them by type.
pub struct ResourceStore {
    slots: Vec<Slot>,
    loaded: DashMap<TypeId, Loaded>,
}

impl ResourceStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            loaded: DashMap::new(),
        }
    }

    /// Registers `T` to be loaded during setup.
    #[must_use]
    pub fn with<T: Resource>(mut self) -> Self {
        let ty = TypeId::of::<T>();
        if self.slots.iter().any(|s| s.ty == ty) {
            tracing::debug!(resource = T::name(), "resource already registered; keeping first");
            return self;
        }
        self.slots.push(Slot {
            name: T::name(),
            ty,
            load: Box::new(|| {
                async { T::load().await.map(|v| Arc::new(v) as Loaded) }.boxed()
            }),
        });
        self
    }

    /// Returns the loaded instance of `T`, if any.
    pub fn get<T: Resource>(&self) -> Option<Arc<T>> {
        let entry = self.loaded.get(&TypeId::of::<T>())?;
        Arc::clone(entry.value()).downcast::<T>().ok()
    }

    /// Returns true if `T` was loaded.
    pub fn contains<T: Resource>(&self) -> bool {
        self.loaded.contains_key(&TypeId::of::<T>())
    }

    /// Number of successfully loaded resources.
    pub fn len(&self) -> usize {
        self.loaded.len()
    }

    /// True when nothing is loaded.
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty()
    }

    /// Number of registered resource types.
    pub fn registered(&self) -> usize {
        self.slots.len()
    }
}

impl Default for ResourceStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Participant for ResourceStore {
    fn name(&self) -> &str {
        "resources"
    }

    async fn setup(&self) -> Result<(), SetupError> {
        tracing::info!(resources = self.slots.len(), "loading resources");
        for slot in &self.slots {
            match (slot.load)().await {
                Ok(value) => {
                    self.loaded.entry(slot.ty).or_insert(value);
                }
                Err(error) => {
                    tracing::warn!(resource = slot.name, %error, "resource failed to load; skipped");
                }
            }
        }
        tracing::info!(loaded = self.loaded.len(), "resources loaded");
        Ok(())
    }
}

impl std::fmt::Debug for ResourceStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.slots.iter().map(|s| s.name).collect();
        f.debug_struct("ResourceStore")
            .field("registered", &names)
            .field("loaded", &self.loaded.len())
            .finish()
    }
}
