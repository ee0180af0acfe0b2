//! # Subscriber callbacks, one handle type per arity.
//!
//! A callback is created once and then passed by reference to
//! [`EventBus::subscribe`](crate::EventBus::subscribe) and
//! [`EventBus::unsubscribe`](crate::EventBus::unsubscribe). Its **identity** is
//! the shared allocation behind the handle: clones of the same handle are the
//! same subscription, two handles built from identical closures are not.
//!
//! ```text
//! Callback0        ── Fn()         ──► Delivery::Nullary
//! Callback1<T>     ── Fn(&T)       ──► Delivery::Unary  { TypeId(T) }
//! Callback2<A, B>  ── Fn(&A, &B)   ──► Delivery::Binary { TypeId(A), TypeId(B) }
//! ```
//!
//! Publishing matches on the arity variant first; payload types are then
//! compared by `TypeId`, so a `Callback1<u32>` never sees a `publish_with(topic, "text")`.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerResult;

type Nullary = dyn Fn() -> HandlerResult + Send + Sync;
type Unary<T> = dyn Fn(&T) -> HandlerResult + Send + Sync;
type Binary<A, B> = dyn Fn(&A, &B) -> HandlerResult + Send + Sync;

/// Identity of a subscribed callback (address of its shared allocation).
#[doc(hidden)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerKey(usize);

impl ListenerKey {
    fn of<F: ?Sized>(f: &Arc<F>) -> Self {
        Self(Arc::as_ptr(f) as *const () as usize)
    }
}

/// Stored form of a subscription, tagged by arity.
#[doc(hidden)]
#[derive(Clone)]
pub enum Delivery {
    Nullary(Arc<Nullary>),
    Unary {
        payload: TypeId,
        handler: Arc<dyn Any + Send + Sync>,
    },
    Binary {
        payload: (TypeId, TypeId),
        handler: Arc<dyn Any + Send + Sync>,
    },
}

impl Delivery {
    /// Invokes a nullary delivery; `None` when the arity does not match.
    pub(crate) fn call0(&self) -> Option<HandlerResult> {
        match self {
            Delivery::Nullary(f) => Some(f()),
            _ => None,
        }
    }

    /// Invokes a unary delivery whose payload type is `T`.
    pub(crate) fn call1<T: 'static>(&self, value: &T) -> Option<HandlerResult> {
        match self {
            Delivery::Unary { payload, handler } if *payload == TypeId::of::<T>() => handler
                .downcast_ref::<Arc<Unary<T>>>()
                .map(|f| f(value)),
            _ => None,
        }
    }

    /// Invokes a binary delivery whose payload types are `(A, B)`.
    pub(crate) fn call2<A: 'static, B: 'static>(&self, a: &A, b: &B) -> Option<HandlerResult> {
        match self {
            Delivery::Binary { payload, handler }
                if *payload == (TypeId::of::<A>(), TypeId::of::<B>()) =>
            {
                handler.downcast_ref::<Arc<Binary<A, B>>>().map(|f| f(a, b))
            }
            _ => None,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Implemented by [`Callback0`], [`Callback1`] and [`Callback2`].
///
/// Sealed: the bus only knows how to dispatch these three arities.
pub trait Listener: sealed::Sealed {
    #[doc(hidden)]
    fn key(&self) -> ListenerKey;

    #[doc(hidden)]
    fn delivery(&self) -> Delivery;
}

/// Callback without payload.
///
/// # Example
/// ```
/// use tickvisor::{Callback0, EventBus};
///
/// let bus = EventBus::new();
/// let on_pause = Callback0::new(|| Ok(()));
/// bus.subscribe("game.paused", &on_pause).unwrap();
/// bus.publish("game.paused").unwrap();
/// ```
pub struct Callback0(Arc<Nullary>);

impl Callback0 {
    /// Wraps a closure into a subscribable callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn() -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

/// Callback receiving one payload value of type `T`.
pub struct Callback1<T>(Arc<Unary<T>>);

impl<T: 'static> Callback1<T> {
    /// Wraps a closure into a subscribable callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&T) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

/// Callback receiving two payload values of types `A` and `B`.
pub struct Callback2<A, B>(Arc<Binary<A, B>>);

impl<A: 'static, B: 'static> Callback2<A, B> {
    /// Wraps a closure into a subscribable callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&A, &B) -> HandlerResult + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }
}

impl Clone for Callback0 {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<T> Clone for Callback1<T> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl<A, B> Clone for Callback2<A, B> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl sealed::Sealed for Callback0 {}
impl<T: 'static> sealed::Sealed for Callback1<T> {}
impl<A: 'static, B: 'static> sealed::Sealed for Callback2<A, B> {}

impl Listener for Callback0 {
    fn key(&self) -> ListenerKey {
        ListenerKey::of(&self.0)
    }

    fn delivery(&self) -> Delivery {
        Delivery::Nullary(Arc::clone(&self.0))
    }
}

impl<T: 'static> Listener for Callback1<T> {
    fn key(&self) -> ListenerKey {
        ListenerKey::of(&self.0)
    }

    fn delivery(&self) -> Delivery {
        Delivery::Unary {
            payload: TypeId::of::<T>(),
            handler: Arc::new(Arc::clone(&self.0)),
        }
    }
}

impl<A: 'static, B: 'static> Listener for Callback2<A, B> {
    fn key(&self) -> ListenerKey {
        ListenerKey::of(&self.0)
    }

    fn delivery(&self) -> Delivery {
        Delivery::Binary {
            payload: (TypeId::of::<A>(), TypeId::of::<B>()),
            handler: Arc::new(Arc::clone(&self.0)),
        }
    }
}

impl fmt::Debug for Callback0 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback0").field(&self.key()).finish()
    }
}

impl<T: 'static> fmt::Debug for Callback1<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback1")
            .field(&std::any::type_name::<T>())
            .field(&self.key())
            .finish()
    }
}

impl<A: 'static, B: 'static> fmt::Debug for Callback2<A, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback2")
            .field(&std::any::type_name::<A>())
            .field(&std::any::type_name::<B>())
            .field(&self.key())
            .finish()
    }
}
