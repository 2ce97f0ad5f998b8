//! Workflow definition storage
//!
//! Definitions live in a per-tenant container, one `{workflow}.json` blob per
//! workflow. The container is the tenant's configured storage path, or the
//! tenant id when none is set.

use crate::errors::RulesEngineError;
use async_trait::async_trait;
use cache_system::TrackingIds;
use config::TenantConfiguration;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::Debug;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Read access to one tenant's workflow container
#[async_trait]
pub trait BlobProvider: Send + Sync + Debug {
    /// Blob content, `None` when the blob does not exist
    async fn get(&self, path: &str, tracking: &TrackingIds) -> Result<Option<String>, RulesEngineError>;
}

/// Resolves the workflow container of a tenant
#[async_trait]
pub trait BlobProviderFactory: Send + Sync {
    async fn create_workflow_provider(
        &self,
        tenant: &TenantConfiguration,
    ) -> Result<Arc<dyn BlobProvider>, RulesEngineError>;
}

fn workflow_container(tenant: &TenantConfiguration) -> String {
    tenant
        .rules_engine
        .as_ref()
        .and_then(|rules_engine| rules_engine.storage_path.clone())
        .unwrap_or_else(|| tenant.id.clone())
}

fn relative_path(path: &str) -> Result<&Path, RulesEngineError> {
    let relative = Path::new(path);
    if relative.as_os_str().is_empty()
        || !relative
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        return Err(RulesEngineError::Storage(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("blob path '{path}' must be relative and stay inside its container"),
        )));
    }
    Ok(relative)
}

/// Workflow containers as directories under a root
#[derive(Debug, Clone)]
pub struct FileSystemBlobProviderFactory {
    root: PathBuf,
}

impl FileSystemBlobProviderFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl BlobProviderFactory for FileSystemBlobProviderFactory {
    async fn create_workflow_provider(
        &self,
        tenant: &TenantConfiguration,
    ) -> Result<Arc<dyn BlobProvider>, RulesEngineError> {
        let container = workflow_container(tenant);
        let directory = self.root.join(relative_path(&container)?);
        Ok(Arc::new(FileSystemBlobProvider { directory }))
    }
}

#[derive(Debug)]
pub struct FileSystemBlobProvider {
    directory: PathBuf,
}

#[async_trait]
impl BlobProvider for FileSystemBlobProvider {
    async fn get(&self, path: &str, tracking: &TrackingIds) -> Result<Option<String>, RulesEngineError> {
        let file = self.directory.join(relative_path(path)?);
        match tokio::fs::read_to_string(&file).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(%tracking, file = %file.display(), "workflow blob not found");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process blob store, shared by every provider it hands out
#[derive(Debug, Clone, Default)]
pub struct InMemoryBlobStore {
    blobs: Arc<RwLock<HashMap<String, String>>>,
    reads: Arc<AtomicUsize>,
}

impl InMemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, container: &str, path: &str, content: impl Into<String>) {
        self.blobs
            .write()
            .insert(format!("{container}/{path}"), content.into());
    }

    pub fn remove(&self, container: &str, path: &str) -> Option<String> {
        self.blobs.write().remove(&format!("{container}/{path}"))
    }

    /// Number of reads served so far, hits and misses alike
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobProviderFactory for InMemoryBlobStore {
    async fn create_workflow_provider(
        &self,
        tenant: &TenantConfiguration,
    ) -> Result<Arc<dyn BlobProvider>, RulesEngineError> {
        Ok(Arc::new(InMemoryBlobProvider {
            store: self.clone(),
            container: workflow_container(tenant),
        }))
    }
}

#[derive(Debug)]
pub struct InMemoryBlobProvider {
    store: InMemoryBlobStore,
    container: String,
}

#[async_trait]
impl BlobProvider for InMemoryBlobProvider {
    async fn get(&self, path: &str, _tracking: &TrackingIds) -> Result<Option<String>, RulesEngineError> {
        self.store.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .store
            .blobs
            .read()
            .get(&format!("{}/{path}", self.container))
            .cloned())
    }
}
