//! Flag evaluation strategies

use crate::context::EventContext;
use crate::errors::EvaluationError;
use crate::fan_out::ConcurrentFanOutEvaluator;
use async_trait::async_trait;
use config::TenantConfiguration;
use std::collections::HashMap;
use std::sync::Arc;

/// Evaluates a single feature flag for a tenant and environment
#[async_trait]
pub trait SingleFlagEvaluator: Send + Sync {
    async fn is_enabled(
        &self,
        feature: &str,
        tenant: &TenantConfiguration,
        environment: &str,
    ) -> anyhow::Result<bool>;
}

/// Evaluates a batch of feature flags
#[async_trait]
pub trait EvaluationStrategy: Send + Sync {
    async fn evaluate(
        &self,
        features: &[String],
        tenant: &TenantConfiguration,
        environment: &str,
        event: &EventContext,
    ) -> Result<HashMap<String, bool>, EvaluationError>;
}

/// Evaluates every flag of a batch concurrently
#[derive(Clone)]
pub struct AsyncEvaluationStrategy {
    single_flag_evaluator: Arc<dyn SingleFlagEvaluator>,
    fan_out: ConcurrentFanOutEvaluator,
}

impl std::fmt::Debug for AsyncEvaluationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncEvaluationStrategy").finish_non_exhaustive()
    }
}

impl AsyncEvaluationStrategy {
    pub fn new(single_flag_evaluator: Arc<dyn SingleFlagEvaluator>) -> Self {
        Self {
            single_flag_evaluator,
            fan_out: ConcurrentFanOutEvaluator::new(),
        }
    }
}

#[async_trait]
impl EvaluationStrategy for AsyncEvaluationStrategy {
    async fn evaluate(
        &self,
        features: &[String],
        tenant: &TenantConfiguration,
        environment: &str,
        event: &EventContext,
    ) -> Result<HashMap<String, bool>, EvaluationError> {
        let tenant = Arc::new(tenant.clone());
        let environment: Arc<str> = Arc::from(environment);
        let evaluator = Arc::clone(&self.single_flag_evaluator);

        let outcome = self
            .fan_out
            .evaluate(features.iter().cloned(), event, move |feature| {
                let evaluator = Arc::clone(&evaluator);
                let tenant = Arc::clone(&tenant);
                let environment = Arc::clone(&environment);
                async move { evaluator.is_enabled(&feature, &tenant, &environment).await }
            })
            .await?;

        Ok(outcome.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PrefixEvaluator;

    #[async_trait]
    impl SingleFlagEvaluator for PrefixEvaluator {
        async fn is_enabled(
            &self,
            feature: &str,
            tenant: &TenantConfiguration,
            environment: &str,
        ) -> anyhow::Result<bool> {
            if feature == "broken" {
                anyhow::bail!("flag {feature} has no definition for {}", tenant.id);
            }
            Ok(environment == "prod" && feature.starts_with("enabled"))
        }
    }

    #[tokio::test]
    async fn test_strategy_evaluates_all_features() {
        let strategy = AsyncEvaluationStrategy::new(Arc::new(PrefixEvaluator));
        let event = EventContext::new("EvaluateFeatureFlags");
        let features = vec!["enabled-checkout".to_string(), "beta-search".to_string()];

        let results = strategy
            .evaluate(&features, &TenantConfiguration::new("Contoso"), "prod", &event)
            .await
            .unwrap();

        assert_eq!(results.get("enabled-checkout"), Some(&true));
        assert_eq!(results.get("beta-search"), Some(&false));
        assert_eq!(event.property("enabled-checkout").as_deref(), Some("true"));
        assert!(event.property("beta-search:TimeTaken").is_some());
    }

    #[tokio::test]
    async fn test_strategy_propagates_failure() {
        let strategy = AsyncEvaluationStrategy::new(Arc::new(PrefixEvaluator));
        let features = vec!["enabled-checkout".to_string(), "broken".to_string()];

        let error = strategy
            .evaluate(
                &features,
                &TenantConfiguration::new("Contoso"),
                "prod",
                &EventContext::default(),
            )
            .await
            .unwrap_err();

        assert_eq!(error.key(), "broken");
    }
}
