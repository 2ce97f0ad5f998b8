//! Error types for the flighting-cache crate
//!
//! This module contains all error types that can be returned by the coordinator.

use cache_system::CacheError;
use config::ConfigError;
use evaluation::EvaluationError;
use rules_engine::RulesEngineError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlightingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Rules engine error: {0}")]
    RulesEngine(#[from] RulesEngineError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Tenant not configured: {0}")]
    TenantNotFound(String),
}
