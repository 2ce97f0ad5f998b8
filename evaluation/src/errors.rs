//! Error types for batch evaluation

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Evaluation of '{key}' failed: {source}")]
    Evaluation {
        key: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Evaluation of '{key}' panicked")]
    Panicked { key: String },
}

impl EvaluationError {
    /// Key whose evaluation failed
    pub fn key(&self) -> &str {
        match self {
            Self::Evaluation { key, .. } | Self::Panicked { key } => key,
        }
    }
}
