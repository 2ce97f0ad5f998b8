//! Correlation identifiers threaded through every cache call

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation and transaction ids used only for log correlation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingIds {
    pub correlation_id: String,
    pub transaction_id: String,
}

impl TrackingIds {
    /// Fresh random ids, used by background work that has no inbound request
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4().to_string(),
            transaction_id: Uuid::new_v4().to_string(),
        }
    }

    pub fn from_ids(correlation_id: impl Into<String>, transaction_id: impl Into<String>) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            transaction_id: transaction_id.into(),
        }
    }
}

impl Default for TrackingIds {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TrackingIds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.correlation_id, self.transaction_id)
    }
}
