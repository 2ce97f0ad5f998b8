//! Cache system for background-refreshable cached objects
//!
//! This crate provides the cacheable-object contract (parameters, objects,
//! producer traits) and the boundary to the external key-value cache, with
//! Redis and in-process backends resolved per tenant.

pub mod errors;
pub mod factory;
pub mod memory;
pub mod object;
pub mod params;
pub mod prelude;
pub mod redis_cache;
pub mod service;
pub mod store;
pub mod tracking;

// Re-export centralized config
pub use config::{CacheConfig, CacheKind};

pub use errors::CacheError;
pub use factory::{CacheFactory, TenantCacheFactory};
pub use memory::InMemoryCache;
pub use object::CacheableObject;
pub use params::CacheParameters;
pub use redis_cache::{RedisCache, RedisConnection};
pub use service::{BackgroundCacheable, BackgroundCacheableService, CacheableService, ObjectCached};
pub use store::{Cache, CacheExt};
pub use tracking::TrackingIds;
