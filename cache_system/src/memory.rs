//! In-process cache backend
//!
//! Used for tenants configured with `CacheKind::InMemory`, and as the store
//! behind tests. Expired entries read as absent and are dropped lazily.

use crate::errors::CacheError;
use crate::store::Cache;
use crate::tracking::TrackingIds;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// HashMap-backed cache with per-entry relative expiration
#[derive(Debug, Default)]
pub struct InMemoryCache {
    entries: RwLock<HashMap<String, Entry>>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired(now))
            .count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every entry
    pub async fn purge(&self) {
        self.entries.write().await.clear();
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(
        &self,
        key: &str,
        _tracking: &TrackingIds,
    ) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                Some(entry) if !entry.is_expired(now) => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut entries = self.entries.write().await;
        if entries.get(key).is_some_and(|entry| entry.is_expired(now)) {
            entries.remove(key);
        }
        Ok(None)
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        _tracking: &TrackingIds,
        relative_expiration_minutes: i64,
    ) -> Result<(), CacheError> {
        let expires_at = u64::try_from(relative_expiration_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .and_then(|minutes| {
                Instant::now().checked_add(Duration::from_secs(minutes.saturating_mul(60)))
            });

        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry { value, expires_at });
        Ok(())
    }

    async fn remove(&self, key: &str, _tracking: &TrackingIds) -> Result<bool, CacheError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
