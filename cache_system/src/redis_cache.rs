//! Redis cache backend
//!
//! [`RedisConnection`] owns the client and a lazily created multiplexed
//! connection shared by every tenant. [`RedisCache`] is the tenant/category
//! scoped view handed out by the cache factory.

use crate::errors::CacheError;
use crate::store::Cache;
use crate::tracking::TrackingIds;
use async_trait::async_trait;
use config::CacheConfig;
use redis::{AsyncCommands, Client};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Shared Redis client with a lazily established connection
#[derive(Clone)]
pub struct RedisConnection {
    client: Arc<Client>,
    config: Arc<CacheConfig>,
    connection_pool: Arc<RwLock<Option<redis::aio::MultiplexedConnection>>>,
}

impl Debug for RedisConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let connection_status = match self.connection_pool.try_read() {
            Ok(pool) => {
                if pool.is_some() {
                    "connected"
                } else {
                    "no_connection"
                }
            }
            Err(_) => "lock_busy",
        };

        f.debug_struct("RedisConnection")
            .field("key_prefix", &self.config.key_prefix)
            .field("connected", &connection_status)
            .finish()
    }
}

impl RedisConnection {
    /// Create a new Redis connection holder. No I/O happens until first use.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let client = Client::open(config.redis_url.as_str())?;

        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
            connection_pool: Arc::new(RwLock::new(None)),
        })
    }

    /// Get or create Redis connection
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection, CacheError> {
        {
            let pool = self.connection_pool.read().await;
            if let Some(connection) = pool.as_ref() {
                return Ok(connection.clone());
            }
        }

        let mut pool = self.connection_pool.write().await;
        if pool.is_none() {
            let connection = self
                .with_timeout(self.client.get_multiplexed_async_connection())
                .await??;
            *pool = Some(connection);
        }

        pool.as_ref()
            .cloned()
            .ok_or_else(|| CacheError::Connection("Failed to get connection from pool".into()))
    }

    async fn with_timeout<F, T>(&self, fut: F) -> Result<T, CacheError>
    where
        F: Future<Output = T>,
    {
        let timeout = Duration::from_millis(self.config.connection_timeout_ms);
        tokio::time::timeout(timeout, fut)
            .await
            .map_err(|_| CacheError::Timeout)
    }

    /// Generate the namespaced key for a tenant-scoped entry
    pub fn build_key(&self, tenant: &str, category: &str, key: &str) -> String {
        format!("{}:{}:{}:{}", self.config.key_prefix, tenant, category, key)
    }

    async fn get(&self, cache_key: &str) -> Result<Option<String>, CacheError> {
        let mut conn = self.get_connection().await?;
        let value: Option<String> = self.with_timeout(conn.get(cache_key)).await??;
        Ok(value)
    }

    async fn set(&self, cache_key: &str, value: &str, ttl_seconds: Option<u64>) -> Result<(), CacheError> {
        let mut conn = self.get_connection().await?;
        match ttl_seconds {
            Some(ttl) => {
                let _: () = self.with_timeout(conn.set_ex(cache_key, value, ttl)).await??;
            }
            None => {
                let _: () = self.with_timeout(conn.set(cache_key, value)).await??;
            }
        }
        Ok(())
    }

    async fn delete(&self, cache_key: &str) -> Result<bool, CacheError> {
        let mut conn = self.get_connection().await?;
        let deleted: i32 = self.with_timeout(conn.del(cache_key)).await??;
        Ok(deleted > 0)
    }

    /// Ping Redis to check connectivity
    pub async fn ping(&self) -> Result<String, CacheError> {
        let mut conn = self.get_connection().await?;
        let pong: String = self
            .with_timeout(redis::cmd("PING").query_async(&mut conn))
            .await??;
        Ok(pong)
    }

    /// Get current configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }
}

/// Redis-backed cache scoped to one tenant and cache category
#[derive(Debug, Clone)]
pub struct RedisCache {
    connection: Arc<RedisConnection>,
    tenant: String,
    category: String,
}

impl RedisCache {
    pub fn new(connection: Arc<RedisConnection>, tenant: &str, category: &str) -> Self {
        Self {
            connection,
            tenant: tenant.to_string(),
            category: category.to_string(),
        }
    }

    fn key(&self, key: &str) -> String {
        self.connection.build_key(&self.tenant, &self.category, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get_raw(
        &self,
        key: &str,
        tracking: &TrackingIds,
    ) -> Result<Option<String>, CacheError> {
        let cache_key = self.key(key);
        tracing::trace!(%tracking, cache_key = %cache_key, "redis get");
        self.connection.get(&cache_key).await
    }

    async fn set_raw(
        &self,
        key: &str,
        value: String,
        tracking: &TrackingIds,
        relative_expiration_minutes: i64,
    ) -> Result<(), CacheError> {
        let cache_key = self.key(key);
        let ttl_seconds = u64::try_from(relative_expiration_minutes)
            .ok()
            .filter(|minutes| *minutes > 0)
            .map(|minutes| minutes.saturating_mul(60));
        tracing::trace!(%tracking, cache_key = %cache_key, ?ttl_seconds, "redis set");
        self.connection.set(&cache_key, &value, ttl_seconds).await
    }

    async fn remove(&self, key: &str, tracking: &TrackingIds) -> Result<bool, CacheError> {
        let cache_key = self.key(key);
        tracing::trace!(%tracking, cache_key = %cache_key, "redis delete");
        self.connection.delete(&cache_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_tenant_and_category_scoped() {
        let connection = Arc::new(
            RedisConnection::new(CacheConfig::new(
                "redis://localhost:6379".to_string(),
                "flighting".to_string(),
                3000,
            ))
            .expect("valid url"),
        );
        let cache = RedisCache::new(connection, "Contoso", "RulesEngine");

        assert_eq!(cache.key("Onboarding"), "flighting:Contoso:RulesEngine:Onboarding");
    }

    #[test]
    fn test_invalid_url_is_rejected() {
        let result = RedisConnection::new(CacheConfig::new(
            "not a url".to_string(),
            "flighting".to_string(),
            3000,
        ));
        assert!(result.is_err());
    }
}
