//! 内存后端 `DnsBackend` trait 实现

use async_trait::async_trait;

use crate::error::Result;
use crate::traits::{DnsBackend, ProviderErrorMapper};
use crate::types::{
    BackendCapabilities, BackendLimits, BackendMetadata, Capability, EntryRef, EntryUpdate,
    NewEntry, Page, PagePointer, RecordEntry, RecordSetFilter, RecordSetKey, RegionMap,
    ResourceRecordSet, WriteMode, Zone,
};
use crate::utils::log_sanitizer::summarize_records;

use super::store::{BackendCall, Fault};
use super::{InMemoryBackend, MAX_PAGE_SIZE, MEMORY_PROVIDER_ID, default_capabilities};

impl InMemoryBackend {
    /// Reject writes outside the declared write mode.
    fn ensure_mode(&self, mode: WriteMode, operation: &str) -> Result<()> {
        if self.capabilities.write_mode == mode {
            Ok(())
        } else {
            Err(self.unsupported(operation))
        }
    }

    /// Offset encoded in a token cursor.
    fn offset(&self, cursor: Option<&PagePointer>) -> Result<usize> {
        match cursor {
            None => Ok(0),
            Some(PagePointer::Token { token }) => token.parse().map_err(|e| self.parse_error(e)),
            Some(PagePointer::RecordSet { .. }) => {
                Err(self.invalid_cursor("expected an offset token"))
            }
        }
    }

    /// The page of `items` starting at `offset`.
    fn page_at<T>(&self, items: Vec<T>, offset: usize) -> Page<T> {
        let end = offset.saturating_add(self.page_size);
        let next = (end < items.len()).then(|| PagePointer::token(end.to_string()));
        Page::new(
            items.into_iter().skip(offset).take(self.page_size).collect(),
            next,
        )
    }
}

#[async_trait]
impl DnsBackend for InMemoryBackend {
    fn id(&self) -> &'static str {
        MEMORY_PROVIDER_ID
    }

    fn metadata() -> BackendMetadata {
        BackendMetadata {
            id: MEMORY_PROVIDER_ID.to_string(),
            name: "In-memory".to_string(),
            description: "Process-local backend for tests and dry runs".to_string(),
            required_fields: Vec::new(),
            capabilities: default_capabilities(),
            limits: BackendLimits {
                max_page_size: MAX_PAGE_SIZE,
            },
        }
    }

    fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    async fn get_zone(&self, zone: &str) -> Result<Zone> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::GetZone {
            zone: zone.to_string(),
        })?;
        store
            .zone(zone)
            .map(|state| state.zone.clone())
            .ok_or_else(|| self.zone_not_found(zone))
    }

    async fn list_zones(&self, cursor: Option<&PagePointer>) -> Result<Page<Zone>> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::ListZones)?;
        let offset = self.offset(cursor)?;
        let zones = store.zones().map(|state| state.zone.clone()).collect();
        Ok(self.page_at(zones, offset))
    }

    async fn list_record_sets(
        &self,
        zone: &str,
        filter: &RecordSetFilter,
        cursor: Option<&PagePointer>,
    ) -> Result<Page<ResourceRecordSet>> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::ListRecordSets {
            zone: zone.to_string(),
        })?;
        let state = store.zone(zone).ok_or_else(|| self.zone_not_found(zone))?;

        let sets: Vec<ResourceRecordSet> = state
            .record_sets()
            .into_iter()
            .filter(|rrset| filter.matches(&rrset.key()))
            .collect();
        if sets.is_empty()
            && self.not_found_on_empty
            && let Some(name) = &filter.name
        {
            return Err(self.record_not_found(name));
        }

        // 按 (name, type, qualifier) 续页
        let start = match cursor {
            None => 0,
            Some(pointer) => {
                let key = pointer
                    .as_record_set()
                    .ok_or_else(|| self.invalid_cursor("expected a record-set cursor"))?;
                sets.iter()
                    .position(|rrset| rrset.key() == key)
                    .ok_or_else(|| self.invalid_cursor(format!("no record set {key}")))?
            }
        };
        let end = start.saturating_add(self.page_size);
        let next = sets.get(end).map(|rrset| PagePointer::record_set(&rrset.key()));
        let items = sets.into_iter().skip(start).take(self.page_size).collect();

        Ok(Page::new(items, next))
    }

    async fn list_entries(
        &self,
        zone: &str,
        key: &RecordSetKey,
        cursor: Option<&PagePointer>,
    ) -> Result<Page<RecordEntry>> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::ListEntries {
            zone: zone.to_string(),
            key: key.clone(),
        })?;
        let state = store.zone(zone).ok_or_else(|| self.zone_not_found(zone))?;

        let entries: Vec<RecordEntry> = state
            .entries
            .iter()
            .filter(|e| e.key() == *key)
            .cloned()
            .collect();
        if entries.is_empty() && self.not_found_on_empty {
            return Err(self.record_not_found(&key.to_string()));
        }

        let offset = self.offset(cursor)?;
        Ok(self.page_at(entries, offset))
    }

    async fn replace_record_set(&self, zone: &str, rrset: &ResourceRecordSet) -> Result<()> {
        self.ensure_mode(WriteMode::ReplaceSet, "replace_record_set")?;
        let key = rrset.key();
        let mut store = self.store.lock().await;
        store.record(BackendCall::ReplaceRecordSet {
            zone: zone.to_string(),
            key: key.clone(),
        })?;
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        let ttl = rrset.ttl().unwrap_or(state.zone.ttl);
        state.entries.retain(|e| e.key() != key);
        for rdata in rrset.records() {
            state.insert(&NewEntry::for_record_set(rrset, rdata.clone(), ttl));
        }
        log::debug!(
            "[memory] Replaced {key} with {}",
            summarize_records(rrset.records())
        );

        store.mark_write(self.capabilities.requires_commit);
        Ok(())
    }

    async fn delete_record_set(&self, zone: &str, key: &RecordSetKey) -> Result<()> {
        self.ensure_mode(WriteMode::ReplaceSet, "delete_record_set")?;
        let mut store = self.store.lock().await;
        store.record(BackendCall::DeleteRecordSet {
            zone: zone.to_string(),
            key: key.clone(),
        })?;
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        let before = state.entries.len();
        state.entries.retain(|e| e.key() != *key);
        if state.entries.len() == before {
            return Err(self.record_not_found(&key.to_string()));
        }
        log::debug!("[memory] Deleted {key}");

        store.mark_write(self.capabilities.requires_commit);
        Ok(())
    }

    async fn create_entry(&self, zone: &str, entry: &NewEntry) -> Result<EntryRef> {
        self.ensure_mode(WriteMode::PerEntry, "create_entry")?;
        let key = entry.key();
        let mut store = self.store.lock().await;
        store.record(BackendCall::CreateEntry {
            zone: zone.to_string(),
            key: key.clone(),
        })?;
        let raced = store.take_fault(|f| {
            matches!(f, Fault::ConcurrentCreate | Fault::ConcurrentCreateWithTtl(_))
        });
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        if self.capabilities.requires_pool && !state.pools.contains(&key) {
            return Err(self.pool_not_found(&key.to_string()));
        }
        match raced {
            Some(Fault::ConcurrentCreateWithTtl(ttl)) => {
                state.insert(&NewEntry {
                    ttl,
                    ..entry.clone()
                });
            }
            Some(_) => {
                state.insert(entry);
            }
            None => {}
        }
        if state
            .entries
            .iter()
            .any(|e| e.key() == key && e.rdata == entry.rdata)
        {
            return Err(self.record_exists(&entry.name, "record.exists"));
        }

        let entry_ref = state.insert(entry);
        log::debug!("[memory] Created {key} {} as {entry_ref}", entry.rdata);

        store.mark_write(self.capabilities.requires_commit);
        Ok(entry_ref)
    }

    async fn update_entry(&self, zone: &str, entry: &EntryRef, update: &EntryUpdate) -> Result<()> {
        self.ensure_mode(WriteMode::PerEntry, "update_entry")?;
        if !self.capabilities.entry_metadata_update
            && (update.ttl.is_some() || update.group.is_some())
        {
            return Err(self.unsupported("update_entry metadata"));
        }
        let mut store = self.store.lock().await;
        store.record(BackendCall::UpdateEntry {
            zone: zone.to_string(),
            entry: entry.clone(),
        })?;
        let raced = store
            .take_fault(|f| matches!(f, Fault::ConcurrentDelete))
            .is_some();
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        if raced {
            state.remove(entry);
        }
        let Some(stored) = state.entries.iter_mut().find(|e| e.entry_ref == *entry) else {
            return Err(self.record_not_found(entry.as_str()));
        };
        if let Some(ttl) = update.ttl {
            stored.ttl = ttl;
        }
        if let Some(rdata) = &update.rdata {
            stored.rdata = rdata.clone();
        }
        if let Some(group) = &update.group {
            stored.group = group.clone();
        }
        log::debug!("[memory] Updated {entry}");

        store.mark_write(self.capabilities.requires_commit);
        Ok(())
    }

    async fn delete_entry(&self, zone: &str, entry: &EntryRef) -> Result<()> {
        self.ensure_mode(WriteMode::PerEntry, "delete_entry")?;
        let mut store = self.store.lock().await;
        store.record(BackendCall::DeleteEntry {
            zone: zone.to_string(),
            entry: entry.clone(),
        })?;
        let raced = store
            .take_fault(|f| matches!(f, Fault::ConcurrentDelete))
            .is_some();
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        if raced {
            state.remove(entry);
        }
        if !state.remove(entry) {
            return Err(self.record_not_found(entry.as_str()));
        }
        log::debug!("[memory] Deleted {entry}");

        store.mark_write(self.capabilities.requires_commit);
        Ok(())
    }

    async fn create_pool(&self, zone: &str, key: &RecordSetKey) -> Result<()> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::CreatePool {
            zone: zone.to_string(),
            key: key.clone(),
        })?;
        let state = store
            .zone_mut(zone)
            .ok_or_else(|| self.zone_not_found(zone))?;

        if !state.pools.insert(key.clone()) {
            return Err(self.record_exists(&key.to_string(), "pool.exists"));
        }
        log::debug!("[memory] Created pool {key}");

        store.mark_write(self.capabilities.requires_commit);
        Ok(())
    }

    async fn commit(&self, zone: &str) -> Result<()> {
        let mut store = self.store.lock().await;
        store.record(BackendCall::Commit {
            zone: zone.to_string(),
        })?;
        if store.zone(zone).is_none() {
            return Err(self.zone_not_found(zone));
        }
        log::debug!("[memory] Committed {} pending writes", store.pending_writes);
        store.pending_writes = 0;
        Ok(())
    }

    async fn probe_capability(&self, capability: Capability) -> Result<bool> {
        self.store
            .lock()
            .await
            .record(BackendCall::Probe { capability })?;

        match capability {
            Capability::Geo if !self.capabilities.geo => Ok(false),
            Capability::Geo if !self.geo_enabled => Err(self.feature_not_enabled("geo")),
            Capability::Geo => Ok(true),
            Capability::Weighted => Ok(self.capabilities.weighted && self.weighted_enabled),
        }
    }

    async fn supported_regions(&self) -> Result<RegionMap> {
        self.store
            .lock()
            .await
            .record(BackendCall::SupportedRegions)?;

        if !self.capabilities.geo {
            return Err(self.unsupported("supported_regions"));
        }
        Ok(self.regions.clone())
    }
}
