//! Convenience re-exports for common flighting-cache usage
//!
//! # Example
//!
//! ```rust
//! use flighting_cache::prelude::*;
//! ```

// Core coordinator components
pub use crate::core::FlightingCache;
pub use crate::errors::FlightingError;
pub use crate::flags::RulesEngineFlagEvaluator;

// Re-export centralized config
pub use config::{AppConfig, BackgroundConfig, CacheConfig, CacheKind, TenantConfiguration};

// Member crates
pub use background_cache::prelude::*;
pub use cache_system::prelude::*;
pub use evaluation::prelude::*;
pub use rules_engine::prelude::*;
pub use signal_system::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use tokio;
