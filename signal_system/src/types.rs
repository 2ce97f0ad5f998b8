//! Type definitions for signal system

use std::sync::Arc;

/// Synchronous event callback. Callbacks run on the emitting task and must stay fast.
pub type EventCallback<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// Handle identifying a registered callback, used to unsubscribe it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(pub(crate) u64);

impl CallbackId {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CallbackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "callback-{}", self.0)
    }
}
