//! Cache-population event types
//!
//! This module defines the notification a producer raises after it has
//! stored an object in the external cache.

use serde::{Deserialize, Serialize};

/// Raised by a producer after a successful cache write
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectCachedEvent<P> {
    /// Identity of the producer that cached the object
    pub service_id: String,
    /// Parameters the object was cached with
    pub parameters: P,
    /// Event timestamp (UTC)
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl<P> ObjectCachedEvent<P> {
    pub fn new(service_id: impl Into<String>, parameters: P) -> Self {
        Self {
            service_id: service_id.into(),
            parameters,
            timestamp: chrono::Utc::now(),
        }
    }
}
