//! # flighting-cache
//!
//! Background-refreshed caching of per-tenant rule evaluators and concurrent
//! feature-flag evaluation.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use flighting_cache::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let flighting = FlightingCache::from_config(config)?;
//!
//!     let cancel = CancellationToken::new();
//!     flighting.start(cancel.clone()).await;
//!
//!     let tracking = TrackingIds::new();
//!     if let Some(evaluator) = flighting
//!         .build_rules_evaluator("Contoso", "Onboarding", &tracking)
//!         .await?
//!     {
//!         println!("loaded workflow {}", evaluator.workflow_name());
//!     }
//!
//!     let event = EventContext::new("EvaluateFeatureFlags");
//!     let flags = flighting
//!         .evaluate_flags("Contoso", &["Onboarding".to_string()], "prod", &event)
//!         .await?;
//!     println!("flags: {flags:?}");
//!
//!     flighting.shutdown().await;
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod flags;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::FlightingCache;
pub use errors::FlightingError;
pub use flags::RulesEngineFlagEvaluator;

// Re-export centralized config
pub use config::{AppConfig, BackgroundConfig, CacheConfig, TenantConfiguration};

// Re-export member crates
pub use background_cache;
pub use cache_system;
pub use evaluation;
pub use rules_engine;
pub use signal_system;

// Re-export external dependencies used in public API
pub use async_trait;
pub use tokio_util;
