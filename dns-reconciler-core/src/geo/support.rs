//! Lazily probed geo/weighted capability guard.

use std::borrow::Cow;
use std::sync::Arc;

use dns_reconciler_provider::{
    BackendCapabilities, Capability, DnsBackend, ProviderError, RegionMap, ResourceRecordSet,
};
use tokio::sync::OnceCell;

use crate::error::{CoreError, CoreResult};
use crate::geo::builder::GeoBuilder;
use crate::geo::catalog::RegionCatalog;
use crate::geo::validator;

/// Probes a backend's optional features once and caches its region catalog.
///
/// A capability the backend does not declare is never probed. A probe that
/// fails with [`ProviderError::FeatureNotEnabled`] is remembered as
/// "unsupported"; any other probe failure is returned and the next call
/// probes again.
pub struct GeoSupport {
    backend: Arc<dyn DnsBackend>,
    capabilities: BackendCapabilities,
    geo: OnceCell<bool>,
    weighted: OnceCell<bool>,
    catalog: OnceCell<Arc<RegionCatalog>>,
}

impl GeoSupport {
    pub fn new(backend: Arc<dyn DnsBackend>) -> Self {
        let capabilities = backend.capabilities();
        Self {
            backend,
            capabilities,
            geo: OnceCell::new(),
            weighted: OnceCell::new(),
            catalog: OnceCell::new(),
        }
    }

    /// Whether `capability` is usable on this backend and account.
    pub async fn supports(&self, capability: Capability) -> CoreResult<bool> {
        if !self.capabilities.declares(capability) {
            return Ok(false);
        }
        let cell = match capability {
            Capability::Geo => &self.geo,
            Capability::Weighted => &self.weighted,
        };
        let supported = cell
            .get_or_try_init(|| async {
                match self.backend.probe_capability(capability).await {
                    Ok(supported) => Ok(supported),
                    Err(ProviderError::FeatureNotEnabled { .. }) => Ok(false),
                    Err(e) => Err(e),
                }
            })
            .await?;
        log::debug!("[{}] {capability} support: {supported}", self.backend.id());
        Ok(*supported)
    }

    /// Fail with [`CoreError::CapabilityUnavailable`] unless `capability` is usable.
    pub async fn require(&self, capability: Capability) -> CoreResult<()> {
        if self.supports(capability).await? {
            Ok(())
        } else {
            Err(CoreError::CapabilityUnavailable {
                backend: self.backend.id().to_string(),
                capability,
            })
        }
    }

    /// The backend's region catalog, fetched on first use.
    pub async fn catalog(&self) -> CoreResult<Arc<RegionCatalog>> {
        self.require(Capability::Geo).await?;
        let catalog = self
            .catalog
            .get_or_try_init(|| async {
                let regions = self.backend.supported_regions().await?;
                log::info!(
                    "[{}] Loaded region catalog with {} regions",
                    self.backend.id(),
                    regions.len()
                );
                Ok::<_, CoreError>(Arc::new(RegionCatalog::new(regions)))
            })
            .await?;
        Ok(Arc::clone(catalog))
    }

    /// Geo handle, or `None` when geo record sets are unavailable.
    pub async fn geo(&self) -> CoreResult<Option<GeoHandle>> {
        if !self.supports(Capability::Geo).await? {
            return Ok(None);
        }
        self.handle().await.map(Some)
    }

    /// Geo handle, failing with [`CoreError::CapabilityUnavailable`].
    pub async fn handle(&self) -> CoreResult<GeoHandle> {
        let catalog = self.catalog().await?;
        Ok(GeoHandle { catalog })
    }
}

/// Region operations bound to one backend's catalog.
#[derive(Debug, Clone)]
pub struct GeoHandle {
    catalog: Arc<RegionCatalog>,
}

impl GeoHandle {
    pub fn supported_regions(&self) -> &RegionMap {
        self.catalog.supported_regions()
    }

    pub fn catalog(&self) -> &Arc<RegionCatalog> {
        &self.catalog
    }

    /// Check `proposed` against the catalog.
    pub fn validate_regions(&self, proposed: &RegionMap) -> CoreResult<()> {
        self.catalog.validate(proposed)
    }

    /// Validate `to_add`, then merge it into `existing`.
    pub fn add_regions<'a>(
        &self,
        existing: &'a ResourceRecordSet,
        to_add: &RegionMap,
    ) -> CoreResult<Cow<'a, ResourceRecordSet>> {
        self.validate_regions(to_add)?;
        validator::add_regions(existing, to_add)
    }

    /// A [`GeoBuilder`] sharing this catalog.
    pub fn builder(&self) -> GeoBuilder {
        GeoBuilder::new(Arc::clone(&self.catalog))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::regions;
    use dns_reconciler_provider::{BackendCall, Fault, InMemoryBackend};

    fn backend(caps: BackendCapabilities, geo_enabled: bool) -> Arc<InMemoryBackend> {
        Arc::new(
            InMemoryBackend::builder()
                .capabilities(caps)
                .geo_enabled(geo_enabled)
                .regions(regions(&[("Mexico", &["Mexico"]), ("United States", &["Alaska"])]))
                .build(),
        )
    }

    fn probes(calls: &[BackendCall]) -> usize {
        calls
            .iter()
            .filter(|c| matches!(c, BackendCall::Probe { .. }))
            .count()
    }

    #[tokio::test]
    async fn undeclared_capability_is_never_probed() {
        let backend = backend(BackendCapabilities::replace_set(), true);
        let support = GeoSupport::new(backend.clone());

        assert!(!support.supports(Capability::Geo).await.unwrap());
        assert!(support.geo().await.unwrap().is_none());
        assert_eq!(probes(&backend.calls().await), 0);
    }

    #[tokio::test]
    async fn feature_not_enabled_memoizes_as_unsupported() {
        let backend = backend(BackendCapabilities::replace_set().with_geo(), false);
        let support = GeoSupport::new(backend.clone());

        assert!(!support.supports(Capability::Geo).await.unwrap());
        assert!(!support.supports(Capability::Geo).await.unwrap());
        let err = support.require(Capability::Geo).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::CapabilityUnavailable { capability: Capability::Geo, .. }
        ));
        assert_eq!(probes(&backend.calls().await), 1);
    }

    #[tokio::test]
    async fn other_probe_errors_are_retried() {
        let backend = backend(BackendCapabilities::replace_set().with_geo(), true);
        backend
            .inject(Fault::Fail {
                operation: "probe_capability",
                error: ProviderError::Timeout {
                    provider: "memory".to_string(),
                    detail: "probe".to_string(),
                },
            })
            .await;
        let support = GeoSupport::new(backend.clone());

        assert!(matches!(
            support.supports(Capability::Geo).await,
            Err(CoreError::Provider(ProviderError::Timeout { .. }))
        ));
        assert!(support.supports(Capability::Geo).await.unwrap());
        assert!(support.supports(Capability::Geo).await.unwrap());
        assert_eq!(probes(&backend.calls().await), 2);
    }

    #[tokio::test]
    async fn catalog_is_fetched_once() {
        let backend = backend(BackendCapabilities::replace_set().with_geo(), true);
        let support = GeoSupport::new(backend.clone());

        let first = support.catalog().await.unwrap();
        let second = support.catalog().await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.region_of("Alaska"), Some("United States"));

        let fetches = backend
            .calls()
            .await
            .iter()
            .filter(|c| matches!(c, BackendCall::SupportedRegions))
            .count();
        assert_eq!(fetches, 1);
    }

    #[tokio::test]
    async fn handle_validates_before_adding() {
        let backend = backend(BackendCapabilities::replace_set().with_geo(), true);
        let handle = GeoSupport::new(backend).geo().await.unwrap().unwrap();
        let rrset = ResourceRecordSet::builder("www", "A")
            .qualifier("us")
            .geo(regions(&[("United States", &["Alaska"])]))
            .build()
            .unwrap();

        let err = handle
            .add_regions(&rrset, &regions(&[("Canada", &["Yukon"])]))
            .unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRegion { .. }));

        let added = handle
            .add_regions(&rrset, &regions(&[("Mexico", &["Mexico"])]))
            .unwrap();
        assert!(matches!(added, Cow::Owned(_)));
        assert_eq!(handle.supported_regions().len(), 2);
    }
}
