//! Convenience re-exports for common signal-system usage

pub use crate::event::ObjectCachedEvent;
pub use crate::manager::SignalManager;
pub use crate::types::{CallbackId, EventCallback};
