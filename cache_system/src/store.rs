//! External cache boundary
//!
//! The store itself (get / set / expire by key) lives outside this crate.
//! [`Cache`] is the object-safe surface producers consume; values cross it
//! as JSON so the same contract fits Redis and in-process backends.

use crate::errors::CacheError;
use crate::tracking::TrackingIds;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

/// Tenant-scoped key-value cache with relative expiration
#[async_trait]
pub trait Cache: Send + Sync + Debug {
    /// Get a raw JSON value, `None` when absent or expired
    async fn get_raw(&self, key: &str, tracking: &TrackingIds)
    -> Result<Option<String>, CacheError>;

    /// Store a raw JSON value. `relative_expiration_minutes <= 0` stores without expiry.
    async fn set_raw(
        &self,
        key: &str,
        value: String,
        tracking: &TrackingIds,
        relative_expiration_minutes: i64,
    ) -> Result<(), CacheError>;

    /// Remove a key, returning whether it existed
    async fn remove(&self, key: &str, tracking: &TrackingIds) -> Result<bool, CacheError>;
}

/// Typed access on top of [`Cache`]
#[async_trait]
pub trait CacheExt: Cache {
    async fn get<T>(&self, key: &str, tracking: &TrackingIds) -> Result<Option<T>, CacheError>
    where
        T: DeserializeOwned + Send,
    {
        match self.get_raw(key, tracking).await? {
            Some(json_str) => Ok(Some(serde_json::from_str(&json_str)?)),
            None => Ok(None),
        }
    }

    async fn set<T>(
        &self,
        key: &str,
        value: &T,
        tracking: &TrackingIds,
        relative_expiration_minutes: i64,
    ) -> Result<(), CacheError>
    where
        T: Serialize + Sync,
    {
        let json_str = serde_json::to_string(value)?;
        self.set_raw(key, json_str, tracking, relative_expiration_minutes)
            .await
    }
}

impl<C: Cache + ?Sized> CacheExt for C {}
