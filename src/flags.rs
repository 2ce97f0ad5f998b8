//! Flags backed by rules engine workflows
//!
//! A flag is on for a tenant when the workflow of the same name passes
//! against the request's environment.

use async_trait::async_trait;
use cache_system::TrackingIds;
use config::TenantConfiguration;
use evaluation::SingleFlagEvaluator;
use rules_engine::RulesEngineManager;
use std::collections::HashMap;
use std::sync::Arc;

/// Input property holding the evaluation environment
pub const ENVIRONMENT_FIELD: &str = "Environment";
/// Input property holding the tenant id
pub const TENANT_FIELD: &str = "Tenant";

#[derive(Debug, Clone)]
pub struct RulesEngineFlagEvaluator {
    rules_engine: Arc<RulesEngineManager>,
}

impl RulesEngineFlagEvaluator {
    pub fn new(rules_engine: Arc<RulesEngineManager>) -> Self {
        Self { rules_engine }
    }
}

#[async_trait]
impl SingleFlagEvaluator for RulesEngineFlagEvaluator {
    async fn is_enabled(
        &self,
        feature: &str,
        tenant: &TenantConfiguration,
        environment: &str,
    ) -> anyhow::Result<bool> {
        let tracking = TrackingIds::new();
        let Some(evaluator) = self.rules_engine.build(&tenant.id, feature, &tracking).await? else {
            crate::debug_log!(%tracking, tenant = %tenant.id, feature, "rules engine disabled, flag off");
            return Ok(false);
        };

        let input = HashMap::from([
            (ENVIRONMENT_FIELD.to_string(), environment.to_string()),
            (TENANT_FIELD.to_string(), tenant.id.clone()),
        ]);
        Ok(evaluator.evaluate(&input)?)
    }
}
