//! Signal system for cache-population notifications
//!
//! This crate provides synchronous observer registration: producers own a
//! `SignalManager` and emit an event every time they populate the cache,
//! subscribers register fast callbacks and receive every emitted event.

pub mod event;
pub mod manager;
pub mod prelude;
pub mod types;

pub use event::ObjectCachedEvent;
pub use manager::SignalManager;
pub use types::{CallbackId, EventCallback};
