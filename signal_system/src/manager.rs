use crate::types::{CallbackId, EventCallback};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// Signal manager for cache-population notifications
pub struct SignalManager<E> {
    callbacks: RwLock<Vec<(CallbackId, EventCallback<E>)>>,
    next_id: AtomicU64,
}

impl<E> std::fmt::Debug for SignalManager<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignalManager")
            .field("callback_count", &self.callback_count())
            .finish()
    }
}

impl<E> SignalManager<E> {
    pub fn new() -> Self {
        Self {
            callbacks: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add event callback, returning the handle needed to remove it
    pub fn add_callback<F>(&self, callback: F) -> CallbackId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = CallbackId(self.next_id.fetch_add(1, Ordering::Relaxed));
        match self.callbacks.write() {
            Ok(mut callbacks) => callbacks.push((id, Arc::new(callback))),
            Err(_) => tracing::warn!("signal callback list poisoned, dropping {}", id),
        }
        id
    }

    /// Remove a previously added callback
    pub fn remove_callback(&self, id: CallbackId) -> bool {
        if let Ok(mut callbacks) = self.callbacks.write() {
            let before = callbacks.len();
            callbacks.retain(|(existing, _)| *existing != id);
            return callbacks.len() != before;
        }
        false
    }

    /// Emit event to all subscribers
    pub fn emit(&self, event: &E) {
        // Snapshot so a callback may (un)subscribe without deadlocking
        let snapshot: Vec<EventCallback<E>> = match self.callbacks.read() {
            Ok(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
            Err(_) => return,
        };

        for callback in snapshot {
            callback(event);
        }
    }

    /// Clear all callbacks
    pub fn clear_callbacks(&self) {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.clear();
        }
    }

    /// Get number of registered callbacks
    pub fn callback_count(&self) -> usize {
        self.callbacks.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl<E> Default for SignalManager<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ObjectCachedEvent;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_every_callback() {
        let manager: SignalManager<ObjectCachedEvent<String>> = SignalManager::new();
        let hits = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let hits = Arc::clone(&hits);
            manager.add_callback(move |event: &ObjectCachedEvent<String>| {
                assert_eq!(event.service_id, "producer");
                hits.fetch_add(1, Ordering::SeqCst);
            });
        }

        manager.emit(&ObjectCachedEvent::new("producer", "key".to_string()));
        assert_eq!(hits.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_remove_callback_stops_delivery() {
        let manager: SignalManager<u32> = SignalManager::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        let id = manager.add_callback(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(manager.remove_callback(id));
        assert!(!manager.remove_callback(id));
        manager.emit(&7);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(manager.callback_count(), 0);
    }

    #[test]
    fn test_callback_ids_are_unique() {
        let manager: SignalManager<u32> = SignalManager::new();
        let first = manager.add_callback(|_| {});
        let second = manager.add_callback(|_| {});

        assert_ne!(first, second);
        assert_eq!(manager.callback_count(), 2);

        manager.clear_callbacks();
        assert_eq!(manager.callback_count(), 0);
    }
}
