//! Rules engine producer
//!
//! Compiles per-tenant workflow definitions into rule evaluators and keeps
//! them cached through the cache-system producer contract, so the background
//! cache manager can refresh them before they expire.

pub mod blob;
pub mod errors;
pub mod evaluator;
pub mod manager;
pub mod operator;
pub mod prelude;
pub mod tenant;
pub mod workflow;

pub use blob::{
    BlobProvider, BlobProviderFactory, FileSystemBlobProviderFactory, InMemoryBlobStore,
};
pub use errors::RulesEngineError;
pub use evaluator::RulesEngineEvaluator;
pub use manager::{
    RULES_ENGINE_CACHE_CATEGORY, RULES_ENGINE_SERVICE_ID, RulesEngineManager,
    RulesEngineManagerBuilder, rules_engine_cache_key,
};
pub use operator::{DefaultOperatorStrategy, OperatorStrategy};
pub use tenant::{StaticTenantConfigurationProvider, TenantConfigurationProvider};
pub use workflow::{JsonRuleCompiler, Rule, RuleCompiler, Workflow};
