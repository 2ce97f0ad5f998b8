//! Error types for the rules engine producer

use cache_system::CacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RulesEngineError {
    #[error(
        "Rule engine '{workflow}' of tenant '{tenant}' unavailable: {reason} \
         (operation: {operation}, correlation: {correlation_id}, transaction: {transaction_id})"
    )]
    WorkflowNotFound {
        workflow: String,
        tenant: String,
        reason: String,
        operation: String,
        correlation_id: String,
        transaction_id: String,
    },

    #[error("Invalid workflow '{workflow}': {reason}")]
    InvalidWorkflow { workflow: String, reason: String },

    #[error("Unknown operator: {0}")]
    UnknownOperator(String),

    #[error("Tenant not configured: {0}")]
    TenantNotFound(String),

    #[error("Missing required collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
}
