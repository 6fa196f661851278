//! Backend factories and metadata.

use std::sync::Arc;

use crate::traits::DnsBackend;
use crate::types::{BackendMetadata, CredentialValidationError, Credentials};

#[cfg(feature = "memory")]
use crate::providers::InMemoryBackend;

/// Builds one kind of backend from flat credentials.
///
/// A registry maps backend ids to factories; the factory validates credentials
/// against its metadata before constructing anything.
pub trait BackendFactory: Send + Sync {
    /// Static metadata of the backends this factory builds.
    fn metadata(&self) -> BackendMetadata;

    /// Validate `credentials` and build a backend.
    fn create(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn DnsBackend>, CredentialValidationError>;
}

/// Factory for [`InMemoryBackend`] with default settings.
#[cfg(feature = "memory")]
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryBackendFactory;

#[cfg(feature = "memory")]
impl BackendFactory for InMemoryBackendFactory {
    fn metadata(&self) -> BackendMetadata {
        InMemoryBackend::metadata()
    }

    fn create(
        &self,
        credentials: &Credentials,
    ) -> Result<Arc<dyn DnsBackend>, CredentialValidationError> {
        credentials.validate(&self.metadata())?;
        Ok(Arc::new(InMemoryBackend::new()))
    }
}

/// Factories for every backend enabled via feature flags.
pub fn builtin_factories() -> Vec<Arc<dyn BackendFactory>> {
    vec![
        #[cfg(feature = "memory")]
        Arc::new(InMemoryBackendFactory),
    ]
}

/// Returns metadata for all backends enabled via feature flags.
///
/// Useful for enumerating available backends and their required credential fields.
pub fn get_all_backend_metadata() -> Vec<BackendMetadata> {
    builtin_factories()
        .iter()
        .map(|factory| factory.metadata())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "memory")]
    #[test]
    fn memory_factory_builds_backend() {
        let backend = InMemoryBackendFactory
            .create(&Credentials::new())
            .unwrap();
        assert_eq!(backend.id(), "memory");
    }

    #[cfg(feature = "memory")]
    #[test]
    fn metadata_lists_memory_backend() {
        let metadata = get_all_backend_metadata();
        assert!(metadata.iter().any(|m| m.id == "memory"));
        assert!(metadata.iter().all(|m| m.limits.max_page_size > 0));
    }
}
