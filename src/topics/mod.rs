//! # Topic-keyed publish/subscribe between game systems.
//!
//! ## Contents
//! - [`EventBus`] the bus itself (subscribe, deferred unsubscribe, publish, clear)
//! - [`Topic`] validated topic name
//! - [`Callback0`], [`Callback1`], [`Callback2`] callback handles per arity
//! - [`Removal`] completion handle of a deferred unsubscribe
//!
//! Game systems never hold references to each other; every cross-system
//! effect goes through a topic on this bus.

mod bus;
mod callback;
mod removal;
mod topic;

pub use bus::EventBus;
pub use callback::{Callback0, Callback1, Callback2, Listener};
pub use removal::Removal;
pub use topic::Topic;
