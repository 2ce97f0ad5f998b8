//! Tenant configuration lookup

use crate::errors::RulesEngineError;
use async_trait::async_trait;
use config::TenantConfiguration;
use std::collections::HashMap;

/// Source of per-tenant configuration
#[async_trait]
pub trait TenantConfigurationProvider: Send + Sync {
    async fn get(&self, tenant: &str) -> Result<TenantConfiguration, RulesEngineError>;
}

/// Provider over a fixed set of tenants, typically `AppConfig::tenants`
#[derive(Debug, Clone, Default)]
pub struct StaticTenantConfigurationProvider {
    tenants: HashMap<String, TenantConfiguration>,
}

impl StaticTenantConfigurationProvider {
    pub fn new(tenants: impl IntoIterator<Item = TenantConfiguration>) -> Self {
        Self {
            tenants: tenants.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }
}

#[async_trait]
impl TenantConfigurationProvider for StaticTenantConfigurationProvider {
    async fn get(&self, tenant: &str) -> Result<TenantConfiguration, RulesEngineError> {
        self.tenants
            .get(tenant)
            .cloned()
            .ok_or_else(|| RulesEngineError::TenantNotFound(tenant.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lookup_by_id() {
        let provider = StaticTenantConfigurationProvider::new(vec![TenantConfiguration::new("Contoso")]);

        assert_eq!(provider.get("Contoso").await.unwrap().id, "Contoso");
        assert!(matches!(
            provider.get("Fabrikam").await,
            Err(RulesEngineError::TenantNotFound(t)) if t == "Fabrikam"
        ));
    }
}
