//! Convenience re-exports for common rules-engine usage

pub use crate::blob::{
    BlobProvider, BlobProviderFactory, FileSystemBlobProviderFactory, InMemoryBlobStore,
};
pub use crate::errors::RulesEngineError;
pub use crate::evaluator::RulesEngineEvaluator;
pub use crate::manager::{
    RULES_ENGINE_CACHE_CATEGORY, RULES_ENGINE_SERVICE_ID, RulesEngineManager,
    RulesEngineManagerBuilder,
};
pub use crate::operator::{DefaultOperatorStrategy, OperatorStrategy};
pub use crate::tenant::{StaticTenantConfigurationProvider, TenantConfigurationProvider};
pub use crate::workflow::{JsonRuleCompiler, RuleCompiler, Workflow};
