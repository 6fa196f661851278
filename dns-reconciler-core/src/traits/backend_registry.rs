//! Backend registry abstract Trait

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dns_reconciler_provider::{
    BackendFactory, BackendMetadata, Credentials, DnsBackend, builtin_factories,
};
use tokio::sync::RwLock;

use crate::error::{CoreError, CoreResult};

/// Backend Registry Trait
///
/// Maps a backend id to the factory that builds it. Constructed by the caller
/// and passed around explicitly.
#[async_trait]
pub trait BackendRegistry: Send + Sync {
    /// Register a factory under its metadata id, replacing any previous one
    async fn register(&self, factory: Arc<dyn BackendFactory>);

    /// Remove a factory
    ///
    /// # Arguments
    /// * `id` - Backend ID
    async fn unregister(&self, id: &str);

    /// Get a factory
    ///
    /// # Arguments
    /// * `id` - Backend ID
    async fn get(&self, id: &str) -> Option<Arc<dyn BackendFactory>>;

    /// List all registered ids, sorted
    async fn list_ids(&self) -> Vec<String>;

    /// Metadata of every registered backend, sorted by id
    async fn metadata(&self) -> Vec<BackendMetadata>;

    /// Validate `credentials` and build a backend instance
    async fn create(&self, id: &str, credentials: &Credentials) -> CoreResult<Arc<dyn DnsBackend>> {
        let factory = self
            .get(id)
            .await
            .ok_or_else(|| CoreError::BackendNotFound(id.to_string()))?;
        let backend = factory.create(credentials)?;
        log::info!("[{id}] Backend created");
        Ok(backend)
    }
}

/// In-memory backend registry
#[derive(Clone)]
pub struct InMemoryBackendRegistry {
    factories: Arc<RwLock<HashMap<String, Arc<dyn BackendFactory>>>>,
}

impl InMemoryBackendRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry holding every backend compiled into the provider crate
    #[must_use]
    pub fn with_defaults() -> Self {
        let factories = builtin_factories()
            .into_iter()
            .map(|factory| (factory.metadata().id, factory))
            .collect();
        Self {
            factories: Arc::new(RwLock::new(factories)),
        }
    }
}

impl Default for InMemoryBackendRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BackendRegistry for InMemoryBackendRegistry {
    async fn register(&self, factory: Arc<dyn BackendFactory>) {
        let id = factory.metadata().id;
        log::debug!("[{id}] Backend factory registered");
        self.factories.write().await.insert(id, factory);
    }

    async fn unregister(&self, id: &str) {
        self.factories.write().await.remove(id);
    }

    async fn get(&self, id: &str) -> Option<Arc<dyn BackendFactory>> {
        self.factories.read().await.get(id).cloned()
    }

    async fn list_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.factories.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    async fn metadata(&self) -> Vec<BackendMetadata> {
        let mut metadata: Vec<BackendMetadata> = self
            .factories
            .read()
            .await
            .values()
            .map(|factory| factory.metadata())
            .collect();
        metadata.sort_by(|a, b| a.id.cmp(&b.id));
        metadata
    }
}
