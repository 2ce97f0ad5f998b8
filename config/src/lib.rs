//! # Configuration Management for flighting-cache
//!
//! This crate provides centralized configuration structures for all flighting-cache
//! components: the external cache connection, the background refresh scheduler, and
//! per-tenant settings (rules engine, cache categories).
//!
//! ## Quick Start
//!
//! ### TOML File Configuration
//! ```toml
//! workflow_root = "workflows"
//!
//! [cache]
//! redis_url = "redis://localhost:6379"
//! key_prefix = "flighting"
//! connection_timeout_ms = 3000
//!
//! [background]
//! enabled = true
//! period_minutes = 5
//!
//! [[tenants]]
//! id = "Contoso"
//!
//! [tenants.rules_engine]
//! enabled = true
//! cache_duration = 30
//!
//! [tenants.cache]
//! RulesEngine = "InMemory"
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from FLIGHTING_CONFIG or ./flighting.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::{env, path::Path};
use thiserror::Error;

const DEFAULT_CONFIG_PATH: &str = "./flighting.toml";
const CONFIG_PATH_ENV: &str = "FLIGHTING_CONFIG";

/// Directory holding per-tenant workflow definitions when none is configured
pub const DEFAULT_WORKFLOW_ROOT: &str = "workflows";

/// Sweep period used when none (or a non-positive one) is configured
pub const DEFAULT_SWEEP_PERIOD_MINUTES: i64 = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub background: BackgroundConfig,
    #[serde(default)]
    pub tenants: Vec<TenantConfiguration>,
    /// Root of the per-tenant workflow directories
    #[serde(default)]
    pub workflow_root: Option<String>,
}

/// External cache (Redis) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub redis_url: String,
    pub key_prefix: String,
    pub connection_timeout_ms: u64,
}

/// Background refresh scheduler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackgroundConfig {
    pub enabled: bool,
    /// Minutes between sweeps, also used as the recache grace window
    pub period_minutes: i64,
}

/// Kind of cache backing one tenant cache category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CacheKind {
    Redis,
    InMemory,
}

/// Rules engine settings for a tenant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesEngineConfiguration {
    pub enabled: bool,
    /// Minutes a compiled evaluator stays cached; `<= 0` never expires
    #[serde(default)]
    pub cache_duration: i64,
    /// Directory (or container) holding the tenant's workflow definitions
    #[serde(default)]
    pub storage_path: Option<String>,
}

/// Per-tenant configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TenantConfiguration {
    pub id: String,
    #[serde(default)]
    pub rules_engine: Option<RulesEngineConfiguration>,
    /// Cache category name to backing cache kind. Missing category means no cache.
    #[serde(default)]
    pub cache: HashMap<String, CacheKind>,
}

impl AppConfig {
    /// Load configuration from the TOML file named in .env / environment, or the default path
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_ENV) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified as {} (environment or .env) or in {} file",
                CONFIG_PATH_ENV, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Find a tenant's configuration by id
    pub fn tenant(&self, tenant_id: &str) -> Option<&TenantConfiguration> {
        self.tenants.iter().find(|t| t.id == tenant_id)
    }

    pub fn workflow_root(&self) -> &str {
        self.workflow_root.as_deref().unwrap_or(DEFAULT_WORKFLOW_ROOT)
    }

    /// Whether any tenant routes a cache category to Redis
    pub fn uses_redis(&self) -> bool {
        self.tenants
            .iter()
            .any(|t| t.cache.values().any(|kind| *kind == CacheKind::Redis))
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.uses_redis() && self.cache.redis_url.is_empty() {
            return Err(ConfigError::Invalid(
                "Redis URL cannot be empty when a tenant uses a Redis cache".to_string(),
            ));
        }
        if self.cache.connection_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "Cache connection_timeout_ms must be greater than 0".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for tenant in &self.tenants {
            if tenant.id.trim().is_empty() {
                return Err(ConfigError::Invalid("Tenant id cannot be empty".to_string()));
            }
            if !seen.insert(tenant.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "Tenant '{}' is configured more than once",
                    tenant.id
                )));
            }
        }

        Ok(())
    }
}

impl CacheConfig {
    /// Create a new cache configuration
    pub fn new(redis_url: String, key_prefix: String, connection_timeout_ms: u64) -> Self {
        Self {
            redis_url,
            key_prefix,
            connection_timeout_ms,
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "flighting".to_string(),
            connection_timeout_ms: 3000,
        }
    }
}

impl BackgroundConfig {
    /// Create a new background configuration
    pub fn new(enabled: bool, period_minutes: i64) -> Self {
        Self {
            enabled,
            period_minutes,
        }
    }

    /// Sweep period with non-positive values replaced by the default
    pub fn effective_period_minutes(&self) -> i64 {
        if self.period_minutes > 0 {
            self.period_minutes
        } else {
            DEFAULT_SWEEP_PERIOD_MINUTES
        }
    }
}

impl Default for BackgroundConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            period_minutes: DEFAULT_SWEEP_PERIOD_MINUTES,
        }
    }
}

impl TenantConfiguration {
    /// Create a tenant configuration with no rules engine and no caches
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            rules_engine: None,
            cache: HashMap::new(),
        }
    }

    pub fn with_rules_engine(mut self, rules_engine: RulesEngineConfiguration) -> Self {
        self.rules_engine = Some(rules_engine);
        self
    }

    pub fn with_cache(mut self, category: impl Into<String>, kind: CacheKind) -> Self {
        self.cache.insert(category.into(), kind);
        self
    }

    pub fn is_rules_engine_enabled(&self) -> bool {
        self.rules_engine.as_ref().is_some_and(|re| re.enabled)
    }

    /// Configured rules engine cache duration in minutes (0 when unconfigured)
    pub fn rules_engine_cache_duration(&self) -> i64 {
        self.rules_engine
            .as_ref()
            .map(|re| re.cache_duration)
            .unwrap_or(0)
    }

    /// Cache kind configured for a category, if any
    pub fn cache_kind(&self, category: &str) -> Option<CacheKind> {
        self.cache.get(category).copied()
    }
}

impl RulesEngineConfiguration {
    pub fn new(enabled: bool, cache_duration: i64) -> Self {
        Self {
            enabled,
            cache_duration,
            storage_path: None,
        }
    }

    pub fn with_storage_path(mut self, storage_path: impl Into<String>) -> Self {
        self.storage_path = Some(storage_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[cache]
redis_url = "redis://localhost:6379"
key_prefix = "flighting"
connection_timeout_ms = 3000

[background]
enabled = true
period_minutes = 5

[[tenants]]
id = "Contoso"

[tenants.rules_engine]
enabled = true
cache_duration = 30

[tenants.cache]
RulesEngine = "InMemory"

[[tenants]]
id = "Fabrikam"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config = AppConfig::from_toml_str(SAMPLE).expect("sample config should parse");

        assert_eq!(config.tenants.len(), 2);
        let contoso = config.tenant("Contoso").expect("Contoso configured");
        assert!(contoso.is_rules_engine_enabled());
        assert_eq!(contoso.rules_engine_cache_duration(), 30);
        assert_eq!(contoso.cache_kind("RulesEngine"), Some(CacheKind::InMemory));
        assert_eq!(contoso.cache_kind("Flags"), None);

        let fabrikam = config.tenant("Fabrikam").expect("Fabrikam configured");
        assert!(!fabrikam.is_rules_engine_enabled());
        assert_eq!(fabrikam.rules_engine_cache_duration(), 0);
        assert!(!config.uses_redis());
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config = AppConfig::from_toml_str("").expect("empty config is valid");
        assert!(config.background.enabled);
        assert_eq!(config.background.period_minutes, DEFAULT_SWEEP_PERIOD_MINUTES);
        assert!(config.tenants.is_empty());
        assert_eq!(config.workflow_root(), DEFAULT_WORKFLOW_ROOT);
    }

    #[test]
    fn test_non_positive_period_uses_default() {
        assert_eq!(BackgroundConfig::new(true, 0).effective_period_minutes(), 5);
        assert_eq!(BackgroundConfig::new(true, -3).effective_period_minutes(), 5);
        assert_eq!(BackgroundConfig::new(true, 2).effective_period_minutes(), 2);
    }

    #[test]
    fn test_duplicate_tenant_rejected() {
        let toml = r#"
[[tenants]]
id = "Contoso"

[[tenants]]
id = "Contoso"
"#;
        let err = AppConfig::from_toml_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_redis_tenant_requires_url() {
        let mut config = AppConfig::default();
        config.cache.redis_url = String::new();
        config
            .tenants
            .push(TenantConfiguration::new("Contoso").with_cache("RulesEngine", CacheKind::Redis));

        assert!(config.validate().is_err());
    }
}
