//! Rules engine manager
//!
//! Builds one evaluator per `(tenant, workflow)` from the tenant's stored
//! workflow definition, serves it from the tenant's `RulesEngine` cache when
//! one is configured, and exposes itself to the background cache manager so
//! cached evaluators are rebuilt before they expire.

use crate::blob::BlobProviderFactory;
use crate::errors::RulesEngineError;
use crate::evaluator::RulesEngineEvaluator;
use crate::operator::OperatorStrategy;
use crate::tenant::TenantConfigurationProvider;
use crate::workflow::{JsonRuleCompiler, RuleCompiler, Workflow};
use async_trait::async_trait;
use cache_system::{
    BackgroundCacheable, CacheError, CacheExt, CacheFactory, CacheParameters, CacheableObject,
    CacheableService, ObjectCached, TrackingIds,
};
use signal_system::SignalManager;
use std::sync::Arc;

/// Producer identity registered with the background cache manager
pub const RULES_ENGINE_SERVICE_ID: &str = "RulesEngineManager";

/// Cache category holding compiled workflows
pub const RULES_ENGINE_CACHE_CATEGORY: &str = "RulesEngine";

const CREATE_OPERATION: &str = "CreateCacheableObject";

/// Cache key of a tenant workflow
pub fn rules_engine_cache_key(tenant: &str, workflow: &str) -> String {
    format!("{tenant}_{workflow}")
}

/// Producer of rule evaluators, cached per tenant
pub struct RulesEngineManager {
    operators: Arc<dyn OperatorStrategy>,
    tenant_configuration_provider: Arc<dyn TenantConfigurationProvider>,
    blob_provider_factory: Arc<dyn BlobProviderFactory>,
    cache_factory: Arc<dyn CacheFactory>,
    compiler: Arc<dyn RuleCompiler>,
    object_cached: SignalManager<ObjectCached>,
}

impl std::fmt::Debug for RulesEngineManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RulesEngineManager")
            .field("subscribers", &self.object_cached.callback_count())
            .finish_non_exhaustive()
    }
}

impl RulesEngineManager {
    pub fn builder() -> RulesEngineManagerBuilder {
        RulesEngineManagerBuilder::default()
    }

    /// Evaluator for a tenant workflow.
    ///
    /// `None` when the tenant has the rules engine disabled. A cached evaluator
    /// is returned as is; otherwise one is built and cached.
    pub async fn build(
        &self,
        tenant: &str,
        workflow: &str,
        tracking: &TrackingIds,
    ) -> Result<Option<RulesEngineEvaluator>, RulesEngineError> {
        let tenant_configuration = self.tenant_configuration_provider.get(tenant).await?;
        if !tenant_configuration.is_rules_engine_enabled() {
            tracing::debug!(%tracking, tenant, "rules engine disabled for tenant");
            return Ok(None);
        }

        let parameters =
            CacheParameters::new(rules_engine_cache_key(tenant, workflow), workflow, tenant)
                .with_cache_duration(tenant_configuration.rules_engine_cache_duration());

        if let Some(evaluator) = self.get_cached_object(&parameters, tracking).await {
            tracing::debug!(%tracking, cache_key = %parameters.cache_key, "rules engine cache hit");
            return Ok(Some(evaluator));
        }

        let cacheable = self
            .create_cacheable_object(parameters, true, tracking)
            .await?;
        Ok(Some(cacheable.into_object()))
    }

    fn not_found(
        parameters: &CacheParameters,
        reason: impl Into<String>,
        tracking: &TrackingIds,
    ) -> RulesEngineError {
        RulesEngineError::WorkflowNotFound {
            workflow: parameters.object_id.clone(),
            tenant: parameters.tenant.clone(),
            reason: reason.into(),
            operation: CREATE_OPERATION.to_string(),
            correlation_id: tracking.correlation_id.clone(),
            transaction_id: tracking.transaction_id.clone(),
        }
    }
}

#[async_trait]
impl CacheableService<RulesEngineEvaluator> for RulesEngineManager {
    type Error = RulesEngineError;

    async fn get_cached_object(
        &self,
        parameters: &CacheParameters,
        tracking: &TrackingIds,
    ) -> Option<RulesEngineEvaluator> {
        let cache = self.cache_factory.create(
            &parameters.tenant,
            RULES_ENGINE_CACHE_CATEGORY,
            tracking,
        )?;

        match cache.get::<Workflow>(&parameters.object_id, tracking).await {
            Ok(workflow) => workflow
                .map(|workflow| RulesEngineEvaluator::new(workflow, Arc::clone(&self.operators))),
            Err(e) => {
                tracing::debug!(
                    %tracking,
                    cache_key = %parameters.cache_key,
                    error = %e,
                    "rules engine cache read failed, treating as miss"
                );
                None
            }
        }
    }

    async fn set_cache_object(
        &self,
        cacheable_object: &CacheableObject<RulesEngineEvaluator>,
        tracking: &TrackingIds,
    ) -> Result<(), RulesEngineError> {
        let parameters = &cacheable_object.cache_parameters;
        let Some(cache) =
            self.cache_factory
                .create(&parameters.tenant, RULES_ENGINE_CACHE_CATEGORY, tracking)
        else {
            tracing::debug!(%tracking, tenant = %parameters.tenant, "no rules engine cache configured");
            return Ok(());
        };

        let stored = cache
            .set(
                &parameters.object_id,
                cacheable_object.object.workflow(),
                tracking,
                parameters.cache_duration,
            )
            .await;

        match stored {
            Ok(()) => {
                self.raise_object_cached(parameters);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(
                    %tracking,
                    cache_key = %parameters.cache_key,
                    error = %e,
                    "failed to cache rules engine evaluator"
                );
                Ok(())
            }
        }
    }

    async fn create_cacheable_object(
        &self,
        mut parameters: CacheParameters,
        set_cache: bool,
        tracking: &TrackingIds,
    ) -> Result<CacheableObject<RulesEngineEvaluator>, RulesEngineError> {
        let tenant_configuration = self
            .tenant_configuration_provider
            .get(&parameters.tenant)
            .await?;
        parameters.cache_duration = tenant_configuration.rules_engine_cache_duration();

        let blobs = self
            .blob_provider_factory
            .create_workflow_provider(&tenant_configuration)
            .await?;
        let path = format!("{}.json", parameters.object_id);

        let definition = match blobs.get(&path, tracking).await? {
            Some(definition) if !definition.trim().is_empty() => definition,
            Some(_) => return Err(Self::not_found(&parameters, format!("{path} is empty"), tracking)),
            None => {
                return Err(Self::not_found(
                    &parameters,
                    format!("{path} does not exist"),
                    tracking,
                ));
            }
        };

        let workflow = self.compiler.compile(&parameters.object_id, &definition)?;
        tracing::info!(
            %tracking,
            cache_key = %parameters.cache_key,
            rules = workflow.rules.len(),
            "rules engine evaluator built"
        );

        let cacheable = CacheableObject::new(
            RulesEngineEvaluator::new(workflow, Arc::clone(&self.operators)),
            parameters,
        );
        if set_cache {
            self.set_cache_object(&cacheable, tracking).await?;
        }
        Ok(cacheable)
    }
}

#[async_trait]
impl BackgroundCacheable for RulesEngineManager {
    fn cacheable_service_id(&self) -> &str {
        RULES_ENGINE_SERVICE_ID
    }

    fn object_cached(&self) -> &SignalManager<ObjectCached> {
        &self.object_cached
    }

    async fn recache(
        &self,
        parameters: CacheParameters,
        tracking: &TrackingIds,
    ) -> Result<CacheParameters, CacheError> {
        let cache_key = parameters.cache_key.clone();
        self.create_cacheable_object(parameters, true, tracking)
            .await
            .map(|cacheable| cacheable.cache_parameters)
            .map_err(|e| CacheError::recache(RULES_ENGINE_SERVICE_ID, cache_key, e))
    }
}

/// Assembles a [`RulesEngineManager`]; every collaborator but the compiler is required
#[derive(Default)]
pub struct RulesEngineManagerBuilder {
    operators: Option<Arc<dyn OperatorStrategy>>,
    tenant_configuration_provider: Option<Arc<dyn TenantConfigurationProvider>>,
    blob_provider_factory: Option<Arc<dyn BlobProviderFactory>>,
    cache_factory: Option<Arc<dyn CacheFactory>>,
    compiler: Option<Arc<dyn RuleCompiler>>,
}

impl RulesEngineManagerBuilder {
    pub fn operator_strategy(mut self, operators: Arc<dyn OperatorStrategy>) -> Self {
        self.operators = Some(operators);
        self
    }

    pub fn tenant_configuration_provider(
        mut self,
        provider: Arc<dyn TenantConfigurationProvider>,
    ) -> Self {
        self.tenant_configuration_provider = Some(provider);
        self
    }

    pub fn blob_provider_factory(mut self, factory: Arc<dyn BlobProviderFactory>) -> Self {
        self.blob_provider_factory = Some(factory);
        self
    }

    pub fn cache_factory(mut self, factory: Arc<dyn CacheFactory>) -> Self {
        self.cache_factory = Some(factory);
        self
    }

    /// Defaults to [`JsonRuleCompiler`]
    pub fn compiler(mut self, compiler: Arc<dyn RuleCompiler>) -> Self {
        self.compiler = Some(compiler);
        self
    }

    pub fn build(self) -> Result<RulesEngineManager, RulesEngineError> {
        Ok(RulesEngineManager {
            operators: self
                .operators
                .ok_or(RulesEngineError::MissingCollaborator("operator strategy"))?,
            tenant_configuration_provider: self.tenant_configuration_provider.ok_or(
                RulesEngineError::MissingCollaborator("tenant configuration provider"),
            )?,
            blob_provider_factory: self
                .blob_provider_factory
                .ok_or(RulesEngineError::MissingCollaborator("blob provider factory"))?,
            cache_factory: self
                .cache_factory
                .ok_or(RulesEngineError::MissingCollaborator("cache factory"))?,
            compiler: self
                .compiler
                .unwrap_or_else(|| Arc::new(JsonRuleCompiler::new())),
            object_cached: SignalManager::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::InMemoryBlobStore;
    use crate::operator::DefaultOperatorStrategy;
    use crate::tenant::StaticTenantConfigurationProvider;
    use cache_system::{Cache, TenantCacheFactory};
    use config::{CacheKind, RulesEngineConfiguration, TenantConfiguration};
    use parking_lot::Mutex;
    use std::collections::HashMap;

    const ONBOARDING: &str = r#"{
        "WorkflowName": "Onboarding",
        "Rules": [{ "RuleName": "country", "Operator": "In", "Field": "Country", "Value": "US,CA" }]
    }"#;

    struct Fixture {
        manager: RulesEngineManager,
        blobs: InMemoryBlobStore,
        caches: Arc<TenantCacheFactory>,
        cached: Arc<Mutex<Vec<CacheParameters>>>,
    }

    fn tenants() -> Vec<TenantConfiguration> {
        vec![
            TenantConfiguration::new("Contoso")
                .with_rules_engine(RulesEngineConfiguration::new(true, 30))
                .with_cache(RULES_ENGINE_CACHE_CATEGORY, CacheKind::InMemory),
            TenantConfiguration::new("Fabrikam")
                .with_rules_engine(RulesEngineConfiguration::new(true, 30)),
            TenantConfiguration::new("Northwind")
                .with_rules_engine(RulesEngineConfiguration::new(false, 30)),
        ]
    }

    fn fixture() -> Fixture {
        let blobs = InMemoryBlobStore::new();
        for tenant in ["Contoso", "Fabrikam"] {
            blobs.insert(tenant, "Onboarding.json", ONBOARDING);
        }
        let caches = Arc::new(TenantCacheFactory::new(tenants()));

        let manager = RulesEngineManager::builder()
            .operator_strategy(Arc::new(DefaultOperatorStrategy::new()))
            .tenant_configuration_provider(Arc::new(StaticTenantConfigurationProvider::new(
                tenants(),
            )))
            .blob_provider_factory(Arc::new(blobs.clone()))
            .cache_factory(caches.clone())
            .build()
            .unwrap();

        let cached = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&cached);
        manager
            .object_cached()
            .add_callback(move |event: &ObjectCached| sink.lock().push(event.parameters.clone()));

        Fixture {
            manager,
            blobs,
            caches,
            cached,
        }
    }

    #[tokio::test]
    async fn test_build_creates_caches_and_notifies() {
        let fixture = fixture();
        let tracking = TrackingIds::new();

        let evaluator = fixture
            .manager
            .build("Contoso", "Onboarding", &tracking)
            .await
            .unwrap()
            .expect("rules engine is enabled");

        assert_eq!(evaluator.workflow_name(), "Onboarding");
        let input = HashMap::from([("Country".to_string(), "us".to_string())]);
        assert!(evaluator.evaluate(&input).unwrap());

        let cache = fixture
            .caches
            .in_memory_cache("Contoso", RULES_ENGINE_CACHE_CATEGORY)
            .unwrap();
        assert!(cache.get_raw("Onboarding", &tracking).await.unwrap().is_some());

        let cached = fixture.cached.lock().clone();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].cache_key, "Contoso_Onboarding");
        assert_eq!(cached[0].object_id, "Onboarding");
        assert_eq!(cached[0].cache_duration, 30);
    }

    #[tokio::test]
    async fn test_second_build_is_served_from_cache() {
        let fixture = fixture();
        let tracking = TrackingIds::new();

        fixture.manager.build("Contoso", "Onboarding", &tracking).await.unwrap();
        let evaluator = fixture
            .manager
            .build("Contoso", "Onboarding", &tracking)
            .await
            .unwrap();

        assert!(evaluator.is_some());
        assert_eq!(fixture.blobs.read_count(), 1);
        assert_eq!(fixture.cached.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_tenant_without_cache_rebuilds_silently() {
        let fixture = fixture();
        let tracking = TrackingIds::new();

        for _ in 0..2 {
            let evaluator = fixture
                .manager
                .build("Fabrikam", "Onboarding", &tracking)
                .await
                .unwrap();
            assert!(evaluator.is_some());
        }

        assert_eq!(fixture.blobs.read_count(), 2);
        assert!(fixture.cached.lock().is_empty());
    }

    #[tokio::test]
    async fn test_disabled_tenant_gets_no_evaluator() {
        let fixture = fixture();
        let evaluator = fixture
            .manager
            .build("Northwind", "Onboarding", &TrackingIds::new())
            .await
            .unwrap();

        assert!(evaluator.is_none());
        assert_eq!(fixture.blobs.read_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_workflow_reports_context() {
        let fixture = fixture();
        let tracking = TrackingIds::from_ids("corr-1", "tx-1");

        let error = fixture
            .manager
            .build("Contoso", "Checkout", &tracking)
            .await
            .unwrap_err();

        match error {
            RulesEngineError::WorkflowNotFound {
                workflow,
                tenant,
                operation,
                correlation_id,
                transaction_id,
                ..
            } => {
                assert_eq!(workflow, "Checkout");
                assert_eq!(tenant, "Contoso");
                assert_eq!(operation, "CreateCacheableObject");
                assert_eq!(correlation_id, "corr-1");
                assert_eq!(transaction_id, "tx-1");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(fixture.cached.lock().is_empty());
    }

    #[tokio::test]
    async fn test_blank_definition_is_not_found() {
        let fixture = fixture();
        fixture.blobs.insert("Contoso", "Blank.json", "   ");

        let result = fixture
            .manager
            .build("Contoso", "Blank", &TrackingIds::new())
            .await;
        assert!(matches!(result, Err(RulesEngineError::WorkflowNotFound { .. })));
    }

    #[tokio::test]
    async fn test_recache_rebuilds_and_notifies() {
        let fixture = fixture();
        let tracking = TrackingIds::new();
        let parameters = CacheParameters::new("Contoso_Onboarding", "Onboarding", "Contoso");

        fixture.manager.recache(parameters.clone(), &tracking).await.unwrap();
        fixture.manager.recache(parameters, &tracking).await.unwrap();

        assert_eq!(fixture.blobs.read_count(), 2);
        assert_eq!(fixture.cached.lock().len(), 2);
    }

    struct AdjustableDuration {
        minutes: Mutex<i64>,
    }

    #[async_trait]
    impl TenantConfigurationProvider for AdjustableDuration {
        async fn get(&self, tenant: &str) -> Result<TenantConfiguration, RulesEngineError> {
            Ok(TenantConfiguration::new(tenant)
                .with_rules_engine(RulesEngineConfiguration::new(true, *self.minutes.lock())))
        }
    }

    #[tokio::test]
    async fn test_recache_resolves_current_tenant_duration() {
        let blobs = InMemoryBlobStore::new();
        blobs.insert("Contoso", "Onboarding.json", ONBOARDING);
        let tenant_configuration = Arc::new(AdjustableDuration {
            minutes: Mutex::new(60),
        });
        let manager = RulesEngineManager::builder()
            .operator_strategy(Arc::new(DefaultOperatorStrategy::new()))
            .tenant_configuration_provider(tenant_configuration.clone())
            .blob_provider_factory(Arc::new(blobs))
            .cache_factory(Arc::new(TenantCacheFactory::default()))
            .build()
            .unwrap();
        let tracking = TrackingIds::new();

        manager.build("Contoso", "Onboarding", &tracking).await.unwrap();
        *tenant_configuration.minutes.lock() = 10;

        let rebuilt = manager
            .recache(
                CacheParameters::new("Contoso_Onboarding", "Onboarding", "Contoso")
                    .with_cache_duration(60),
                &tracking,
            )
            .await
            .unwrap();
        assert_eq!(rebuilt.cache_duration, 10);
        assert_eq!(rebuilt.cache_key, "Contoso_Onboarding");
    }

    #[tokio::test]
    async fn test_recache_failure_names_producer_and_key() {
        let fixture = fixture();
        fixture.blobs.remove("Contoso", "Onboarding.json");

        let error = fixture
            .manager
            .recache(
                CacheParameters::new("Contoso_Onboarding", "Onboarding", "Contoso"),
                &TrackingIds::new(),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            error,
            CacheError::Recache { ref service_id, ref cache_key, .. }
                if service_id == RULES_ENGINE_SERVICE_ID && cache_key == "Contoso_Onboarding"
        ));
    }

    #[tokio::test]
    async fn test_unknown_tenant() {
        let result = fixture()
            .manager
            .build("Unknown", "Onboarding", &TrackingIds::new())
            .await;
        assert!(matches!(result, Err(RulesEngineError::TenantNotFound(_))));
    }

    #[test]
    fn test_builder_requires_collaborators() {
        let result = RulesEngineManager::builder()
            .tenant_configuration_provider(Arc::new(StaticTenantConfigurationProvider::default()))
            .blob_provider_factory(Arc::new(InMemoryBlobStore::new()))
            .cache_factory(Arc::new(TenantCacheFactory::default()))
            .build();

        assert!(matches!(
            result,
            Err(RulesEngineError::MissingCollaborator("operator strategy"))
        ));
    }
}
