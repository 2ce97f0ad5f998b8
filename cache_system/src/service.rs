//! Cacheable producer contracts
//!
//! Any component that builds an expensive object implements
//! [`CacheableService`]. Producers that also want their objects refreshed
//! before they go stale implement [`BackgroundCacheable`]; together the two
//! make a [`BackgroundCacheableService`].

use crate::errors::CacheError;
use crate::object::CacheableObject;
use crate::params::CacheParameters;
use crate::tracking::TrackingIds;
use async_trait::async_trait;
use signal_system::{ObjectCachedEvent, SignalManager};

/// Notification raised after a producer stores an object in the cache
pub type ObjectCached = ObjectCachedEvent<CacheParameters>;

/// Get / set / create protocol for producers of cacheable objects
#[async_trait]
pub trait CacheableService<T>: Send + Sync
where
    T: Send + 'static,
{
    /// Domain error raised when an object cannot be built
    type Error: std::error::Error + Send + Sync + 'static;

    /// Look up a cached object. An unavailable cache and a miss both yield `None`.
    async fn get_cached_object(
        &self,
        parameters: &CacheParameters,
        tracking: &TrackingIds,
    ) -> Option<T>;

    /// Store an object with TTL = its cache duration and raise the cached notification.
    /// A tenant without a cache for this category is a silent no-op.
    async fn set_cache_object(
        &self,
        cacheable_object: &CacheableObject<T>,
        tracking: &TrackingIds,
    ) -> Result<(), Self::Error>;

    /// Build a fresh object, caching it immediately when `set_cache` is true
    async fn create_cacheable_object(
        &self,
        parameters: CacheParameters,
        set_cache: bool,
        tracking: &TrackingIds,
    ) -> Result<CacheableObject<T>, Self::Error>;
}

/// Capability set a producer exposes to the background cache manager
#[async_trait]
pub trait BackgroundCacheable: Send + Sync {
    /// Stable identity distinguishing this producer from others on the same manager
    fn cacheable_service_id(&self) -> &str;

    /// Channel raising an event on every successful cache write
    fn object_cached(&self) -> &SignalManager<ObjectCached>;

    /// Rebuild and re-store a previously cached object.
    ///
    /// Returns the parameters the object was rebuilt with, whose cache
    /// duration reflects the producer's current configuration.
    async fn recache(
        &self,
        parameters: CacheParameters,
        tracking: &TrackingIds,
    ) -> Result<CacheParameters, CacheError>;

    /// Emit the cached notification for `parameters`
    fn raise_object_cached(&self, parameters: &CacheParameters) {
        self.object_cached().emit(&ObjectCachedEvent::new(
            self.cacheable_service_id(),
            parameters.clone(),
        ));
    }
}

/// A producer that can both serve cached objects and refresh them in the background
pub trait BackgroundCacheableService<T>: CacheableService<T> + BackgroundCacheable
where
    T: Send + 'static,
{
}

impl<T, S> BackgroundCacheableService<T> for S
where
    T: Send + 'static,
    S: CacheableService<T> + BackgroundCacheable,
{
}
