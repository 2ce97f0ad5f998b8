//! Tenant-scoped cache resolution
//!
//! A producer asks the factory for the cache of `(tenant, category)`.
//! Absence is normal: it means the tenant has no cache for that category
//! and the caller must skip caching.

use crate::memory::InMemoryCache;
use crate::redis_cache::{RedisCache, RedisConnection};
use crate::store::Cache;
use crate::tracking::TrackingIds;
use config::{CacheKind, TenantConfiguration};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Resolves the cache configured for a tenant and category
pub trait CacheFactory: Send + Sync {
    fn create(&self, tenant: &str, category: &str, tracking: &TrackingIds)
    -> Option<Arc<dyn Cache>>;
}

/// Cache factory driven by tenant configuration
#[derive(Debug, Default)]
pub struct TenantCacheFactory {
    tenants: HashMap<String, TenantConfiguration>,
    redis: Option<Arc<RedisConnection>>,
    in_memory: DashMap<(String, String), Arc<InMemoryCache>>,
}

impl TenantCacheFactory {
    pub fn new(tenants: impl IntoIterator<Item = TenantConfiguration>) -> Self {
        Self {
            tenants: tenants.into_iter().map(|t| (t.id.clone(), t)).collect(),
            redis: None,
            in_memory: DashMap::new(),
        }
    }

    pub fn with_redis(mut self, connection: Arc<RedisConnection>) -> Self {
        self.redis = Some(connection);
        self
    }

    /// The shared in-memory cache for a tenant category, if one has been handed out
    pub fn in_memory_cache(&self, tenant: &str, category: &str) -> Option<Arc<InMemoryCache>> {
        self.in_memory
            .get(&(tenant.to_string(), category.to_string()))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl CacheFactory for TenantCacheFactory {
    fn create(
        &self,
        tenant: &str,
        category: &str,
        tracking: &TrackingIds,
    ) -> Option<Arc<dyn Cache>> {
        let kind = self.tenants.get(tenant)?.cache_kind(category)?;

        match kind {
            CacheKind::InMemory => {
                let cache: Arc<dyn Cache> = self
                    .in_memory
                    .entry((tenant.to_string(), category.to_string()))
                    .or_insert_with(|| Arc::new(InMemoryCache::new()))
                    .clone();
                Some(cache)
            }
            CacheKind::Redis => match &self.redis {
                Some(connection) => {
                    let cache: Arc<dyn Cache> =
                        Arc::new(RedisCache::new(Arc::clone(connection), tenant, category));
                    Some(cache)
                }
                None => {
                    tracing::debug!(
                        %tracking,
                        tenant,
                        category,
                        "redis cache configured but no redis connection available"
                    );
                    None
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::CacheConfig;

    fn factory() -> TenantCacheFactory {
        TenantCacheFactory::new(vec![
            TenantConfiguration::new("Contoso").with_cache("RulesEngine", CacheKind::InMemory),
            TenantConfiguration::new("Fabrikam").with_cache("RulesEngine", CacheKind::Redis),
            TenantConfiguration::new("Northwind"),
        ])
    }

    #[test]
    fn test_unconfigured_category_is_absent() {
        let factory = factory();
        let tracking = TrackingIds::new();

        assert!(factory.create("Northwind", "RulesEngine", &tracking).is_none());
        assert!(factory.create("Contoso", "Flags", &tracking).is_none());
        assert!(factory.create("Unknown", "RulesEngine", &tracking).is_none());
    }

    #[test]
    fn test_in_memory_cache_is_shared_per_category() {
        let factory = factory();
        let tracking = TrackingIds::new();

        assert!(factory.create("Contoso", "RulesEngine", &tracking).is_some());
        let first = factory.in_memory_cache("Contoso", "RulesEngine").unwrap();
        factory.create("Contoso", "RulesEngine", &tracking);
        let second = factory.in_memory_cache("Contoso", "RulesEngine").unwrap();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_redis_requires_connection() {
        let tracking = TrackingIds::new();
        assert!(factory().create("Fabrikam", "RulesEngine", &tracking).is_none());

        let connection = RedisConnection::new(CacheConfig::default()).unwrap();
        let with_redis = factory().with_redis(Arc::new(connection));
        assert!(with_redis.create("Fabrikam", "RulesEngine", &tracking).is_some());
    }
}
