//! Error types for cache operations
//!
//! This module defines all error types that can occur
//! during cache operations, Redis interactions and background recaching.

use thiserror::Error;

/// Cache system errors
#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Redis connection error: {0}")]
    ConnectionError(#[from] redis::RedisError),

    #[error("Connection pool error: {0}")]
    Connection(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Cache operation timeout")]
    Timeout,

    #[error("Recache of '{cache_key}' by {service_id} failed: {reason}")]
    Recache {
        service_id: String,
        cache_key: String,
        reason: String,
    },

    #[error("General cache error: {0}")]
    General(String),
}

impl CacheError {
    pub fn recache(
        service_id: impl Into<String>,
        cache_key: impl Into<String>,
        reason: impl std::fmt::Display,
    ) -> Self {
        Self::Recache {
            service_id: service_id.into(),
            cache_key: cache_key.into(),
            reason: reason.to_string(),
        }
    }
}
