//! Convenience re-exports for common cache-system usage

// Core cache system components
pub use crate::errors::CacheError;
pub use crate::factory::{CacheFactory, TenantCacheFactory};
pub use crate::memory::InMemoryCache;
pub use crate::object::CacheableObject;
pub use crate::params::CacheParameters;
pub use crate::redis_cache::{RedisCache, RedisConnection};
pub use crate::service::{
    BackgroundCacheable, BackgroundCacheableService, CacheableService, ObjectCached,
};
pub use crate::store::{Cache, CacheExt};
pub use crate::tracking::TrackingIds;

// Re-export centralized config
pub use config::{CacheConfig, CacheKind};

// Common external dependencies
pub use async_trait::async_trait;
pub use redis;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;
