//! Core flighting-cache functionality
//!
//! This module contains the FlightingCache coordinator, which wires tenant
//! configuration, caches, the rules engine producer and the background cache
//! manager together and owns the lifetime of the background sweep loop.

use background_cache::BackgroundCacheManager;
use cache_system::{BackgroundCacheable, RedisConnection, TenantCacheFactory, TrackingIds};
use config::AppConfig;
use evaluation::{AsyncEvaluationStrategy, EvaluationStrategy, EventContext};
use rules_engine::{
    BlobProviderFactory, DefaultOperatorStrategy, FileSystemBlobProviderFactory,
    RulesEngineEvaluator, RulesEngineManager, StaticTenantConfigurationProvider,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::errors::FlightingError;
use crate::flags::RulesEngineFlagEvaluator;

struct Scheduler {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

/// Main coordinator for cached rule evaluators and flag evaluation
pub struct FlightingCache {
    config: AppConfig,
    cache_factory: Arc<TenantCacheFactory>,
    rules_engine: Arc<RulesEngineManager>,
    background: Arc<BackgroundCacheManager>,
    evaluation: Arc<dyn EvaluationStrategy>,
    scheduler: Mutex<Option<Scheduler>>,
}

impl std::fmt::Debug for FlightingCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightingCache")
            .field("tenants", &self.config.tenants.len())
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}

impl FlightingCache {
    /// Create the coordinator, reading workflows from `config.workflow_root()`
    pub fn from_config(config: AppConfig) -> Result<Self, FlightingError> {
        let blobs = Arc::new(FileSystemBlobProviderFactory::new(config.workflow_root()));
        Self::with_blob_provider_factory(config, blobs)
    }

    /// Create the coordinator with a custom workflow store
    pub fn with_blob_provider_factory(
        config: AppConfig,
        blob_provider_factory: Arc<dyn BlobProviderFactory>,
    ) -> Result<Self, FlightingError> {
        config.validate()?;

        let mut cache_factory = TenantCacheFactory::new(config.tenants.iter().cloned());
        if config.uses_redis() {
            let connection = RedisConnection::new(config.cache.clone())?;
            cache_factory = cache_factory.with_redis(Arc::new(connection));
        }
        let cache_factory = Arc::new(cache_factory);

        let rules_engine = Arc::new(
            RulesEngineManager::builder()
                .operator_strategy(Arc::new(DefaultOperatorStrategy::new()))
                .tenant_configuration_provider(Arc::new(StaticTenantConfigurationProvider::new(
                    config.tenants.iter().cloned(),
                )))
                .blob_provider_factory(blob_provider_factory)
                .cache_factory(cache_factory.clone())
                .build()?,
        );

        let background = Arc::new(BackgroundCacheManager::new(vec![
            Arc::clone(&rules_engine) as Arc<dyn BackgroundCacheable>,
        ]));

        let evaluation: Arc<dyn EvaluationStrategy> = Arc::new(AsyncEvaluationStrategy::new(
            Arc::new(RulesEngineFlagEvaluator::new(Arc::clone(&rules_engine))),
        ));

        tracing::info!(
            tenants = config.tenants.len(),
            redis = config.uses_redis(),
            "flighting cache created"
        );

        Ok(Self {
            config,
            cache_factory,
            rules_engine,
            background,
            evaluation,
            scheduler: Mutex::new(None),
        })
    }

    /// Start background tracking and, when enabled, the periodic sweep loop.
    ///
    /// Starting twice only refreshes the sweep period.
    pub async fn start(&self, cancel: CancellationToken) {
        let period_minutes = self.config.background.effective_period_minutes();
        self.background.init(period_minutes);

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_some() {
            crate::debug_log!("flighting cache already started");
            return;
        }

        let handle = self
            .config
            .background
            .enabled
            .then(|| self.background.spawn_scheduler(cancel.clone()));
        tracing::info!(
            period_minutes,
            scheduler = handle.is_some(),
            "flighting cache started"
        );
        *scheduler = Some(Scheduler { cancel, handle });
    }

    /// Stop the sweep loop, wait for it, and stop background tracking
    pub async fn shutdown(&self) {
        let scheduler = self.scheduler.lock().await.take();
        if let Some(Scheduler { cancel, handle }) = scheduler {
            cancel.cancel();
            if let Some(handle) = handle {
                if let Err(e) = handle.await {
                    tracing::error!(error = %e, "background cache scheduler ended abnormally");
                }
            }
        }
        self.background.cleanup();
        tracing::info!("flighting cache shut down");
    }

    /// Evaluator for a tenant workflow, `None` when the tenant's rules engine is disabled
    pub async fn build_rules_evaluator(
        &self,
        tenant: &str,
        workflow: &str,
        tracking: &TrackingIds,
    ) -> Result<Option<RulesEngineEvaluator>, FlightingError> {
        Ok(self.rules_engine.build(tenant, workflow, tracking).await?)
    }

    /// Evaluate a batch of flags for a tenant concurrently.
    ///
    /// Results and per-flag timings are also attached to `event`.
    pub async fn evaluate_flags(
        &self,
        tenant: &str,
        features: &[String],
        environment: &str,
        event: &EventContext,
    ) -> Result<HashMap<String, bool>, FlightingError> {
        let tenant_configuration = self
            .config
            .tenant(tenant)
            .ok_or_else(|| FlightingError::TenantNotFound(tenant.to_string()))?;

        Ok(self
            .evaluation
            .evaluate(features, tenant_configuration, environment, event)
            .await?)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn cache_factory(&self) -> &Arc<TenantCacheFactory> {
        &self.cache_factory
    }

    pub fn rules_engine(&self) -> &Arc<RulesEngineManager> {
        &self.rules_engine
    }

    pub fn background(&self) -> &Arc<BackgroundCacheManager> {
        &self.background
    }
}
