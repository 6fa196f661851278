//! In-memory reference backend
//!
//! Keeps zones and entries in process memory behind a `tokio` mutex. Every
//! operation is recorded in a call log, and faults can be queued to simulate
//! concurrent writers or failing calls. Its declared capabilities are fully
//! configurable, so one type stands in for whole-set and record-by-record
//! backends alike.

mod error;
mod provider;
mod regions;
mod store;

use tokio::sync::Mutex;

use crate::error::Result;
use crate::types::{
    BackendCapabilities, EntryRef, NewEntry, RecordEntry, RegionMap, ResourceRecordSet, Zone,
};

pub use regions::default_regions;
pub use store::{BackendCall, Fault};

use store::Store;

/// Backend identifier.
pub(crate) const MEMORY_PROVIDER_ID: &str = "memory";
/// Default number of items per listing page.
pub(crate) const DEFAULT_PAGE_SIZE: usize = 100;
/// Largest page size the builder accepts.
pub(crate) const MAX_PAGE_SIZE: u32 = 1000;

/// Capabilities of a backend built with default settings.
pub(crate) fn default_capabilities() -> BackendCapabilities {
    BackendCapabilities::per_entry()
        .with_entry_metadata_update()
        .with_geo()
        .with_weighted()
}

/// In-memory DNS backend.
///
/// # Construction
///
/// ```rust
/// use dns_reconciler_provider::{BackendCapabilities, InMemoryBackend, Zone};
///
/// let backend = InMemoryBackend::builder()
///     .capabilities(BackendCapabilities::replace_set())
///     .page_size(2)
///     .zone(Zone::new("example.com.", 3600, "hostmaster@example.com"))
///     .build();
/// ```
pub struct InMemoryBackend {
    pub(crate) capabilities: BackendCapabilities,
    pub(crate) page_size: usize,
    pub(crate) regions: RegionMap,
    pub(crate) geo_enabled: bool,
    pub(crate) weighted_enabled: bool,
    pub(crate) not_found_on_empty: bool,
    pub(crate) store: Mutex<Store>,
}

/// Builder for [`InMemoryBackend`].
pub struct InMemoryBackendBuilder {
    capabilities: BackendCapabilities,
    page_size: usize,
    regions: RegionMap,
    geo_enabled: bool,
    weighted_enabled: bool,
    not_found_on_empty: bool,
    zones: Vec<Zone>,
}

impl InMemoryBackendBuilder {
    fn new() -> Self {
        Self {
            capabilities: default_capabilities(),
            page_size: DEFAULT_PAGE_SIZE,
            regions: default_regions(),
            geo_enabled: true,
            weighted_enabled: true,
            not_found_on_empty: false,
            zones: Vec::new(),
        }
    }

    /// Declared capabilities (default: per-entry writes with metadata update, geo and weighted).
    pub fn capabilities(mut self, capabilities: BackendCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Items per listing page, clamped to `1..=1000` (default: 100).
    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE as usize);
        self
    }

    /// Supported-region catalog (default: [`default_regions`]).
    pub fn regions(mut self, regions: RegionMap) -> Self {
        self.regions = regions;
        self
    }

    /// Whether the account has geo enabled (default: `true`).
    ///
    /// A backend that declares geo but has it disabled fails the geo probe with
    /// `FeatureNotEnabled`.
    pub fn geo_enabled(mut self, enabled: bool) -> Self {
        self.geo_enabled = enabled;
        self
    }

    /// Whether the account has weighted pools enabled (default: `true`).
    pub fn weighted_enabled(mut self, enabled: bool) -> Self {
        self.weighted_enabled = enabled;
        self
    }

    /// Answer listings narrowed to an absent name with `RecordNotFound`
    /// instead of an empty page (default: `false`).
    pub fn not_found_on_empty_listing(mut self, enabled: bool) -> Self {
        self.not_found_on_empty = enabled;
        self
    }

    /// Pre-create a zone.
    pub fn zone(mut self, zone: Zone) -> Self {
        self.zones.push(zone);
        self
    }

    /// Build the [`InMemoryBackend`] instance.
    pub fn build(self) -> InMemoryBackend {
        let mut store = Store::default();
        for zone in self.zones {
            store.add_zone(zone);
        }
        InMemoryBackend {
            capabilities: self.capabilities,
            page_size: self.page_size,
            regions: self.regions,
            geo_enabled: self.geo_enabled,
            weighted_enabled: self.weighted_enabled,
            not_found_on_empty: self.not_found_on_empty,
            store: Mutex::new(store),
        }
    }
}

impl InMemoryBackend {
    /// Creates an empty backend with default settings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Returns a builder for customizing the backend.
    pub fn builder() -> InMemoryBackendBuilder {
        InMemoryBackendBuilder::new()
    }

    // ==================== 测试辅助 ====================
    // Seeding and inspection bypass the call log and fault queue.

    /// Add (or replace) a zone.
    pub async fn add_zone(&self, zone: Zone) {
        self.store.lock().await.add_zone(zone);
    }

    /// Store `rrset` as-is, replacing whatever `zone` held under its key.
    pub async fn seed(&self, zone: &str, rrset: &ResourceRecordSet) -> Result<()> {
        let mut store = self.store.lock().await;
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;
        let ttl = rrset.ttl().unwrap_or(state.zone.ttl);
        let key = rrset.key();
        state.entries.retain(|e| e.key() != key);
        for rdata in rrset.records() {
            state.insert(&NewEntry::for_record_set(rrset, rdata.clone(), ttl));
        }
        if self.capabilities.requires_pool && !rrset.records().is_empty() {
            state.pools.insert(key);
        }
        Ok(())
    }

    /// Store one entry without any duplicate check.
    pub async fn seed_entry(&self, zone: &str, entry: &NewEntry) -> Result<EntryRef> {
        let mut store = self.store.lock().await;
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;
        if self.capabilities.requires_pool {
            state.pools.insert(entry.key());
        }
        Ok(state.insert(entry))
    }

    /// Snapshot of the record sets stored in `zone`, in key order.
    pub async fn record_sets(&self, zone: &str) -> Vec<ResourceRecordSet> {
        self.store
            .lock()
            .await
            .zone(zone)
            .map(store::ZoneState::record_sets)
            .unwrap_or_default()
    }

    /// Snapshot of the entries stored in `zone`, in insertion order.
    pub async fn entries(&self, zone: &str) -> Vec<RecordEntry> {
        self.store
            .lock()
            .await
            .zone(zone)
            .map(|state| state.entries.clone())
            .unwrap_or_default()
    }

    /// Every call received so far, in order.
    pub async fn calls(&self) -> Vec<BackendCall> {
        self.store.lock().await.calls.clone()
    }

    /// Number of state-changing calls received so far.
    pub async fn write_count(&self) -> usize {
        self.store
            .lock()
            .await
            .calls
            .iter()
            .filter(|c| c.is_write())
            .count()
    }

    /// Forget the call log.
    pub async fn clear_calls(&self) {
        self.store.lock().await.calls.clear();
    }

    /// Writes made since the last commit (only counted when commits are required).
    pub async fn pending_writes(&self) -> usize {
        self.store.lock().await.pending_writes
    }

    /// Queue a fault; it fires on the first matching call.
    pub async fn inject(&self, fault: Fault) {
        self.store.lock().await.faults.push_back(fault);
    }
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}
