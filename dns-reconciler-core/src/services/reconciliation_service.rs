//! 记录集调和服务
//!
//! Drives one backend towards desired record sets with as few writes as the
//! backend's write model allows.

use std::borrow::Cow;
use std::sync::Arc;

use dns_reconciler_provider::{
    BackendCapabilities, Capability, DnsBackend, EntryRef, NewEntry, PagedSequence, ProviderError,
    RecordEntry, RecordSetFilter, RecordSetKey, RegionMap, ResourceRecordSet, WriteMode, Zone,
};
use futures::{FutureExt, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::geo::{GeoHandle, GeoSupport};
use crate::services::plan::{self, PlannedOp, ReconcilePlan};

/// Engine tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileOptions {
    /// Treat a create that finds its entry already there, or a delete that
    /// finds it already gone, as done. When off these surface as
    /// [`CoreError::ConcurrencyLostRace`].
    pub absorb_races: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self { absorb_races: true }
    }
}

/// What an applied plan did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
    pub replaced: usize,
    pub pools_created: usize,
    /// Writes a concurrent writer had already made for us.
    pub absorbed: usize,
    pub committed: bool,
}

impl ReconcileReport {
    /// Writes that changed remote state, commit excluded.
    pub fn writes(&self) -> usize {
        self.created + self.updated + self.deleted + self.replaced + self.pools_created
    }

    pub fn is_noop(&self) -> bool {
        self.writes() == 0 && self.absorbed == 0
    }
}

/// Builder for [`ReconciliationEngine`].
pub struct ReconciliationEngineBuilder {
    backend: Arc<dyn DnsBackend>,
    options: ReconcileOptions,
}

impl ReconciliationEngineBuilder {
    #[must_use]
    pub fn options(mut self, options: ReconcileOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn absorb_races(mut self, absorb: bool) -> Self {
        self.options.absorb_races = absorb;
        self
    }

    pub fn build(self) -> ReconciliationEngine {
        let capabilities = self.backend.capabilities();
        log::debug!(
            "[{}] Engine over {:?} backend (pool: {}, commit: {}, metadata update: {})",
            self.backend.id(),
            capabilities.write_mode,
            capabilities.requires_pool,
            capabilities.requires_commit,
            capabilities.entry_metadata_update
        );
        ReconciliationEngine {
            support: GeoSupport::new(Arc::clone(&self.backend)),
            backend: self.backend,
            capabilities,
            options: self.options,
        }
    }
}

/// Reconciles record sets on one backend.
///
/// Every call is a strictly sequential series of awaited backend calls. Geo and
/// weighted profiles are checked before the first write; nothing is rolled
/// back when a later write fails.
pub struct ReconciliationEngine {
    backend: Arc<dyn DnsBackend>,
    capabilities: BackendCapabilities,
    options: ReconcileOptions,
    support: GeoSupport,
}

impl ReconciliationEngine {
    /// Engine with default options.
    pub fn new(backend: Arc<dyn DnsBackend>) -> Self {
        Self::builder(backend).build()
    }

    pub fn builder(backend: Arc<dyn DnsBackend>) -> ReconciliationEngineBuilder {
        ReconciliationEngineBuilder {
            backend,
            options: ReconcileOptions::default(),
        }
    }

    pub fn backend(&self) -> &Arc<dyn DnsBackend> {
        &self.backend
    }

    pub fn capabilities(&self) -> BackendCapabilities {
        self.capabilities
    }

    pub fn options(&self) -> ReconcileOptions {
        self.options
    }

    /// The backend's capability guard.
    pub fn support(&self) -> &GeoSupport {
        &self.support
    }

    /// Geo handle, or `None` when the backend or account has no geo support.
    pub async fn geo(&self) -> CoreResult<Option<GeoHandle>> {
        self.support.geo().await
    }

    // ===== 读取 =====

    /// Every zone of the account, fetched page by page.
    pub fn list_zones(&self) -> PagedSequence<'static, Zone> {
        let backend = Arc::clone(&self.backend);
        PagedSequence::new(move |cursor| {
            let backend = Arc::clone(&backend);
            async move { backend.list_zones(cursor.as_ref()).await }.boxed()
        })
    }

    /// Record sets of `zone`, optionally narrowed by name and type.
    ///
    /// The filter is applied again on the client, for backends that ignore it.
    pub fn list_all(
        &self,
        zone: &str,
        name: Option<&str>,
        record_type: Option<&str>,
    ) -> PagedSequence<'static, ResourceRecordSet> {
        let filter = RecordSetFilter {
            name: name.map(str::to_string),
            record_type: record_type.map(str::to_string),
            qualifier: None,
        };
        self.record_sets(zone, filter.clone())
            .filter(move |rrset| filter.matches(&rrset.key()))
    }

    /// The record set with exactly this identity, if any.
    pub async fn get(&self, zone: &str, key: &RecordSetKey) -> CoreResult<Option<ResourceRecordSet>> {
        let wanted = key.clone();
        let mut matches = self
            .record_sets(zone, RecordSetFilter::exact(key))
            .filter(move |rrset| rrset.key() == wanted);

        match matches.next().await {
            None | Some(Err(ProviderError::RecordNotFound { .. })) => Ok(None),
            Some(Ok(rrset)) => Ok(Some(rrset)),
            Some(Err(e)) => Err(zone_error(zone, e)),
        }
    }

    fn record_sets(
        &self,
        zone: &str,
        filter: RecordSetFilter,
    ) -> PagedSequence<'static, ResourceRecordSet> {
        let backend = Arc::clone(&self.backend);
        let zone = zone.to_string();
        PagedSequence::new(move |cursor| {
            let backend = Arc::clone(&backend);
            let zone = zone.clone();
            let filter = filter.clone();
            async move {
                backend
                    .list_record_sets(&zone, &filter, cursor.as_ref())
                    .await
            }
            .boxed()
        })
    }

    /// Stored entries of `key`. A record-level miss reads as no entries.
    async fn entries(&self, zone: &str, key: &RecordSetKey) -> CoreResult<Vec<RecordEntry>> {
        let backend = Arc::clone(&self.backend);
        let zone_name = zone.to_string();
        let listed = key.clone();
        let wanted = key.clone();
        let entries = PagedSequence::new(move |cursor| {
            let backend = Arc::clone(&backend);
            let zone = zone_name.clone();
            let key = listed.clone();
            async move { backend.list_entries(&zone, &key, cursor.as_ref()).await }.boxed()
        })
        .filter(move |entry| entry.key() == wanted)
        .collect_all()
        .await;

        match entries {
            Ok(entries) => Ok(entries),
            Err(ProviderError::RecordNotFound { .. }) => {
                log::debug!("[{}] No entries for {key}", self.backend.id());
                Ok(Vec::new())
            }
            Err(e) => Err(zone_error(zone, e)),
        }
    }

    async fn zone_ttl(&self, zone: &str) -> CoreResult<u32> {
        let zone_info = self
            .backend
            .get_zone(zone)
            .await
            .map_err(|e| zone_error(zone, e))?;
        Ok(zone_info.ttl)
    }

    // ===== 校验 =====

    /// Check `proposed` against the backend's region catalog.
    pub async fn validate_regions(&self, proposed: &RegionMap) -> CoreResult<()> {
        self.support.handle().await?.validate_regions(proposed)
    }

    async fn validate(&self, desired: &ResourceRecordSet) -> CoreResult<()> {
        if let Some(geo) = desired.geo() {
            self.support.handle().await?.validate_regions(geo.regions())?;
        }
        if desired.weighted().is_some() {
            self.support.require(Capability::Weighted).await?;
        }
        Ok(())
    }

    // ===== 规划与执行 =====

    /// Operations that would bring `zone` to `desired`, without writing.
    ///
    /// A desired set without rdata plans a [`delete_set`](Self::delete_set).
    pub async fn plan(&self, zone: &str, desired: &ResourceRecordSet) -> CoreResult<ReconcilePlan> {
        let key = desired.key();
        if desired.records().is_empty() {
            return self.plan_delete(zone, &key).await;
        }
        self.validate(desired).await?;

        let plan = match self.capabilities.write_mode {
            WriteMode::ReplaceSet => {
                let current = self.get(zone, &key).await?;
                plan::replace_set(desired, current.as_ref(), &self.capabilities)
            }
            WriteMode::PerEntry => {
                let current = self.entries(zone, &key).await?;
                let ttl = match desired.ttl() {
                    Some(ttl) => ttl,
                    None => self.zone_ttl(zone).await?,
                };
                plan::per_entry(desired, ttl, &current, &self.capabilities)
            }
        };
        log::debug!(
            "[{}] Planned {} writes for {key}",
            self.backend.id(),
            plan.write_count()
        );
        Ok(plan)
    }

    async fn plan_delete(&self, zone: &str, key: &RecordSetKey) -> CoreResult<ReconcilePlan> {
        let plan = match self.capabilities.write_mode {
            WriteMode::ReplaceSet => {
                let current = self.get(zone, key).await?;
                plan::delete_set(key, current.as_ref(), &self.capabilities)
            }
            WriteMode::PerEntry => {
                let current = self.entries(zone, key).await?;
                plan::delete_entries(key, &current, &self.capabilities)
            }
        };
        log::debug!(
            "[{}] Planned {} deletes for {key}",
            self.backend.id(),
            plan.write_count()
        );
        Ok(plan)
    }

    /// Bring the record set identified by `desired` to exactly `desired`.
    ///
    /// Running it again right away writes nothing.
    pub async fn reconcile(
        &self,
        zone: &str,
        desired: &ResourceRecordSet,
    ) -> CoreResult<ReconcileReport> {
        let result = match self.plan(zone, desired).await {
            Ok(plan) => self.apply(zone, &plan).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| e.log(&format!("Reconcile of {} failed", desired.key())))
    }

    /// Remove every entry of `key`. A missing set is not an error.
    pub async fn delete_set(&self, zone: &str, key: &RecordSetKey) -> CoreResult<ReconcileReport> {
        let result = match self.plan_delete(zone, key).await {
            Ok(plan) => self.apply(zone, &plan).await,
            Err(e) => Err(e),
        };
        result.inspect_err(|e| e.log(&format!("Delete of {key} failed")))
    }

    /// Execute `plan` in order. The first failing write stops it.
    pub async fn apply(&self, zone: &str, plan: &ReconcilePlan) -> CoreResult<ReconcileReport> {
        let id = self.backend.id();
        let key = &plan.key;
        let mut report = ReconcileReport::default();

        for op in &plan.ops {
            match op {
                PlannedOp::ReplaceSet(rrset) => {
                    self.backend
                        .replace_record_set(zone, rrset)
                        .await
                        .map_err(|e| zone_error(zone, e))?;
                    log::info!("[{id}] Replaced {key} ({} values)", rrset.records().len());
                    report.replaced += 1;
                }
                PlannedOp::DeleteSet(set) => match self.backend.delete_record_set(zone, set).await {
                    Ok(()) => {
                        log::info!("[{id}] Deleted {set}");
                        report.deleted += 1;
                    }
                    Err(ProviderError::RecordNotFound { .. }) => {
                        self.absorb(key, "record set already deleted")?;
                        report.absorbed += 1;
                    }
                    Err(e) => return Err(zone_error(zone, e)),
                },
                PlannedOp::CreatePool(pool) => match self.backend.create_pool(zone, pool).await {
                    Ok(()) => {
                        log::info!("[{id}] Created pool for {pool}");
                        report.pools_created += 1;
                    }
                    Err(ProviderError::RecordExists { .. }) => {
                        self.absorb(key, "pool already exists")?;
                        report.absorbed += 1;
                    }
                    Err(e) => return Err(zone_error(zone, e)),
                },
                PlannedOp::Create(entry) => match self.backend.create_entry(zone, entry).await {
                    Ok(entry_ref) => {
                        log::info!("[{id}] Created {} in {key} as {entry_ref}", entry.rdata);
                        report.created += 1;
                    }
                    Err(ProviderError::RecordExists { .. }) => {
                        self.absorb(key, &format!("{} already exists", entry.rdata))?;
                        self.confirm_created(zone, key, entry).await?;
                        report.absorbed += 1;
                    }
                    Err(e) => return Err(zone_error(zone, e)),
                },
                PlannedOp::Update {
                    entry,
                    update,
                    recreate,
                } => match self.backend.update_entry(zone, entry, update).await {
                    Ok(()) => {
                        log::info!("[{id}] Updated {entry} in {key}");
                        report.updated += 1;
                    }
                    Err(ProviderError::RecordNotFound { .. }) => {
                        self.recreate(zone, key, entry, recreate).await?;
                        report.created += 1;
                    }
                    Err(e) => return Err(zone_error(zone, e)),
                },
                PlannedOp::Delete(entry) => match self.backend.delete_entry(zone, entry).await {
                    Ok(()) => {
                        log::info!("[{id}] Deleted {entry} from {key}");
                        report.deleted += 1;
                    }
                    Err(ProviderError::RecordNotFound { .. }) => {
                        self.absorb(key, &format!("entry {entry} already deleted"))?;
                        report.absorbed += 1;
                    }
                    Err(e) => return Err(zone_error(zone, e)),
                },
                PlannedOp::Commit => {
                    if report.writes() == 0 {
                        log::debug!("[{id}] Nothing written for {key}, skipping commit");
                        continue;
                    }
                    self.backend
                        .commit(zone)
                        .await
                        .map_err(|e| zone_error(zone, e))?;
                    log::info!("[{id}] Committed {} writes in {zone}", report.writes());
                    report.committed = true;
                }
            }
        }

        Ok(report)
    }

    /// An entry vanished before its update: create it once instead.
    async fn recreate(
        &self,
        zone: &str,
        key: &RecordSetKey,
        entry: &EntryRef,
        recreate: &NewEntry,
    ) -> CoreResult<()> {
        if !self.options.absorb_races {
            return Err(lost_race(key, format!("entry {entry} vanished before update")));
        }
        log::warn!(
            "[{}] Entry {entry} of {key} vanished before update, creating it again",
            self.backend.id()
        );
        match self.backend.create_entry(zone, recreate).await {
            Ok(_) => Ok(()),
            Err(ProviderError::RecordExists { .. }) => Err(lost_race(
                key,
                format!("entry {entry} was replaced by a concurrent writer"),
            )),
            Err(e) => Err(zone_error(zone, e)),
        }
    }

    /// A create lost to a concurrent writer only counts as done when that
    /// writer stored the same value with the same ttl and group metadata.
    async fn confirm_created(
        &self,
        zone: &str,
        key: &RecordSetKey,
        wanted: &NewEntry,
    ) -> CoreResult<()> {
        let entries = self.entries(zone, key).await?;
        if entries
            .iter()
            .any(|e| e.rdata == wanted.rdata && e.ttl == wanted.ttl && e.group == wanted.group)
        {
            return Ok(());
        }
        Err(lost_race(
            key,
            format!("{} was created concurrently with different settings", wanted.rdata),
        ))
    }

        fn absorb(&self, key: &RecordSetKey, detail: &str) -> CoreResult<()> {
        if self.options.absorb_races {
            log::warn!("[{}] {key}: {detail}, treating as done", self.backend.id());
            Ok(())
        } else {
            Err(lost_race(key, detail.to_string()))
        }
    }

    // ===== 区域 =====

    /// Merge `to_add` into the geo profile of the live set `key`.
    ///
    /// Returns `false` without writing when the set already covers `to_add`.
    pub async fn add_regions(
        &self,
        zone: &str,
        key: &RecordSetKey,
        to_add: &RegionMap,
    ) -> CoreResult<bool> {
        let handle = self.support.handle().await?;
        let existing = self
            .get(zone, key)
            .await?
            .ok_or_else(|| CoreError::RecordSetNotFound(key.to_string()))?;

        match handle.add_regions(&existing, to_add)? {
            Cow::Borrowed(_) => {
                log::debug!("[{}] {key} already covers the requested regions", self.backend.id());
                Ok(false)
            }
            Cow::Owned(updated) => {
                self.reconcile(zone, &updated).await?;
                Ok(true)
            }
        }
    }
}

/// A zone-level miss is fatal and reported as such; everything else passes through.
fn zone_error(zone: &str, err: ProviderError) -> CoreError {
    match err {
        ProviderError::ZoneNotFound { .. } => CoreError::ZoneNotFound(zone.to_string()),
        other => CoreError::Provider(other),
    }
}

fn lost_race(key: &RecordSetKey, detail: String) -> CoreError {
    CoreError::ConcurrencyLostRace {
        key: key.to_string(),
        detail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ZONE, a, a_set, backend, regions};
    use dns_reconciler_provider::{BackendCall, Fault, InMemoryBackend};

    fn engine(backend: &Arc<InMemoryBackend>) -> ReconciliationEngine {
        ReconciliationEngine::new(backend.clone())
    }

    #[tokio::test]
    async fn replace_set_writes_once_then_nothing() {
        let backend = backend(BackendCapabilities::replace_set().with_commit());
        let engine = engine(&backend);
        let desired = a_set("www.example.com.", &["192.0.2.1", "192.0.2.2"]);

        let first = engine.reconcile(ZONE, &desired).await.unwrap();
        assert_eq!(first.replaced, 1);
        assert!(first.committed);

        let second = engine.reconcile(ZONE, &desired).await.unwrap();
        assert!(second.is_noop());
        assert!(!second.committed);
        assert_eq!(backend.write_count().await, 2);
        assert_eq!(backend.record_sets(ZONE).await, vec![desired]);
    }

    #[tokio::test]
    async fn per_entry_uses_zone_ttl_when_unset() {
        let backend = backend(BackendCapabilities::per_entry());
        let engine = engine(&backend);
        let desired = ResourceRecordSet::builder("www.example.com.", "A")
            .add(a("192.0.2.1"))
            .build()
            .unwrap();

        engine.reconcile(ZONE, &desired).await.unwrap();
        let entries = backend.entries(ZONE).await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ttl, 3600);

        assert!(engine.reconcile(ZONE, &desired).await.unwrap().is_noop());
    }

    #[tokio::test]
    async fn empty_desired_deletes_everything() {
        let backend = backend(BackendCapabilities::per_entry().with_commit());
        let engine = engine(&backend);
        backend
            .seed(ZONE, &a_set("www.example.com.", &["192.0.2.1", "192.0.2.2"]))
            .await
            .unwrap();

        let empty = ResourceRecordSet::builder("www.example.com.", "A").build().unwrap();
        let report = engine.reconcile(ZONE, &empty).await.unwrap();
        assert_eq!(report.deleted, 2);
        assert!(report.committed);
        assert!(backend.entries(ZONE).await.is_empty());
    }

    #[tokio::test]
    async fn update_retried_as_create_when_entry_vanishes() {
        let backend = backend(BackendCapabilities::per_entry().with_entry_metadata_update());
        let engine = engine(&backend);
        backend
            .seed(ZONE, &a_set("www.example.com.", &["192.0.2.1"]))
            .await
            .unwrap();
        backend.inject(Fault::ConcurrentDelete).await;

        let desired = a_set("www.example.com.", &["192.0.2.1"])
            .to_builder()
            .ttl(60)
            .build()
            .unwrap();
        let report = engine.reconcile(ZONE, &desired).await.unwrap();
        assert_eq!(report.created, 1);
        assert_eq!(report.updated, 0);
        assert_eq!(backend.record_sets(ZONE).await, vec![desired]);
    }

    #[tokio::test]
    async fn strict_engine_reports_lost_races() {
        let backend = backend(BackendCapabilities::per_entry());
        let engine = ReconciliationEngine::builder(backend.clone())
            .absorb_races(false)
            .build();
        backend.inject(Fault::ConcurrentCreate).await;

        let err = engine
            .reconcile(ZONE, &a_set("www.example.com.", &["192.0.2.1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ConcurrencyLostRace { .. }));
        assert!(!err.is_expected());
    }

    #[tokio::test]
    async fn missing_zone_is_fatal() {
        let backend = backend(BackendCapabilities::replace_set());
        let engine = engine(&backend);

        let err = engine
            .reconcile("nowhere.test.", &a_set("www.nowhere.test.", &["192.0.2.1"]))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ZoneNotFound(zone) if zone == "nowhere.test."));
        assert_eq!(backend.write_count().await, 0);
    }

    #[tokio::test]
    async fn get_matches_qualifier_exactly() {
        let backend = backend(BackendCapabilities::replace_set().with_geo());
        let engine = engine(&backend);
        let plain = a_set("www.example.com.", &["192.0.2.1"]);
        let us = ResourceRecordSet::builder("www.example.com.", "A")
            .qualifier("us")
            .ttl(300)
            .add(a("192.0.2.2"))
            .geo(regions(&[("United States", &["Alaska"])]))
            .build()
            .unwrap();
        backend.seed(ZONE, &us).await.unwrap();
        backend.seed(ZONE, &plain).await.unwrap();

        assert_eq!(engine.get(ZONE, &us.key()).await.unwrap(), Some(us));
        assert_eq!(engine.get(ZONE, &plain.key()).await.unwrap(), Some(plain));
        let other = RecordSetKey::new("www.example.com.", "A").with_qualifier("eu");
        assert_eq!(engine.get(ZONE, &other).await.unwrap(), None);
    }

    #[tokio::test]
    async fn dry_run_plan_writes_nothing() {
        let backend = backend(BackendCapabilities::per_entry().with_pool().with_commit());
        let engine = engine(&backend);

        let plan = engine
            .plan(ZONE, &a_set("www.example.com.", &["192.0.2.1"]))
            .await
            .unwrap();
        assert!(matches!(plan.ops[0], PlannedOp::CreatePool(_)));
        assert_eq!(plan.ops.last(), Some(&PlannedOp::Commit));
        assert_eq!(backend.write_count().await, 0);
        assert!(matches!(
            backend.calls().await.as_slice(),
            [BackendCall::ListEntries { .. }]
        ));
    }

    #[test]
    fn options_default_to_absorbing() {
        let options: ReconcileOptions = serde_json::from_str(r#"{"absorbRaces": false}"#).unwrap();
        assert!(!options.absorb_races);
        assert!(ReconcileOptions::default().absorb_races);
    }
}
