//! 内存存储、调用日志与故障注入

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::error::{ProviderError, Result};
use crate::types::{
    Capability, EntryRef, NewEntry, RecordEntry, RecordSetKey, ResourceRecordSet, Zone,
};

/// One call received by an [`InMemoryBackend`](super::InMemoryBackend).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    GetZone { zone: String },
    ListZones,
    ListRecordSets { zone: String },
    ListEntries { zone: String, key: RecordSetKey },
    ReplaceRecordSet { zone: String, key: RecordSetKey },
    DeleteRecordSet { zone: String, key: RecordSetKey },
    CreateEntry { zone: String, key: RecordSetKey },
    UpdateEntry { zone: String, entry: EntryRef },
    DeleteEntry { zone: String, entry: EntryRef },
    CreatePool { zone: String, key: RecordSetKey },
    Commit { zone: String },
    Probe { capability: Capability },
    SupportedRegions,
}

impl BackendCall {
    /// Name of the backend operation this call invoked.
    pub fn operation(&self) -> &'static str {
        match self {
            Self::GetZone { .. } => "get_zone",
            Self::ListZones => "list_zones",
            Self::ListRecordSets { .. } => "list_record_sets",
            Self::ListEntries { .. } => "list_entries",
            Self::ReplaceRecordSet { .. } => "replace_record_set",
            Self::DeleteRecordSet { .. } => "delete_record_set",
            Self::CreateEntry { .. } => "create_entry",
            Self::UpdateEntry { .. } => "update_entry",
            Self::DeleteEntry { .. } => "delete_entry",
            Self::CreatePool { .. } => "create_pool",
            Self::Commit { .. } => "commit",
            Self::Probe { .. } => "probe_capability",
            Self::SupportedRegions => "supported_regions",
        }
    }

    /// Whether the call changes (or publishes) stored state.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::ReplaceRecordSet { .. }
                | Self::DeleteRecordSet { .. }
                | Self::CreateEntry { .. }
                | Self::UpdateEntry { .. }
                | Self::DeleteEntry { .. }
                | Self::CreatePool { .. }
                | Self::Commit { .. }
        )
    }
}

/// A queued fault.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Another writer stores the same entry just before the next `create_entry`.
    ConcurrentCreate,
    /// Like [`ConcurrentCreate`](Self::ConcurrentCreate), but the other writer
    /// stores the value with this ttl instead of the caller's.
    ConcurrentCreateWithTtl(u32),
    /// Another writer removes the targeted entry just before the next
    /// `update_entry` or `delete_entry`.
    ConcurrentDelete,
    /// The next call of `operation` fails with `error`.
    Fail {
        /// Operation name, as in [`BackendCall::operation`].
        operation: &'static str,
        /// Error to return.
        error: ProviderError,
    },
}

#[derive(Debug, Default)]
pub(crate) struct Store {
    zones: BTreeMap<String, ZoneState>,
    pub calls: Vec<BackendCall>,
    pub faults: VecDeque<Fault>,
    pub pending_writes: usize,
}

impl Store {
    pub fn add_zone(&mut self, zone: Zone) {
        self.zones.insert(
            zone.key().to_string(),
            ZoneState {
                zone,
                entries: Vec::new(),
                pools: BTreeSet::new(),
            },
        );
    }

    /// Zone addressed by key, falling back to name.
    pub fn zone(&self, zone: &str) -> Option<&ZoneState> {
        self.zones
            .get(zone)
            .or_else(|| self.zones.values().find(|s| s.zone.name == zone))
    }

    pub fn zone_mut(&mut self, zone: &str) -> Option<&mut ZoneState> {
        let key = if self.zones.contains_key(zone) {
            zone.to_string()
        } else {
            self.zones
                .iter()
                .find(|(_, s)| s.zone.name == zone)
                .map(|(k, _)| k.clone())?
        };
        self.zones.get_mut(&key)
    }

    pub fn zones(&self) -> impl Iterator<Item = &ZoneState> {
        self.zones.values()
    }

    /// Log `call`, failing it if a matching [`Fault::Fail`] is queued.
    pub fn record(&mut self, call: BackendCall) -> Result<()> {
        let operation = call.operation();
        self.calls.push(call);
        let Some(index) = self
            .faults
            .iter()
            .position(|f| matches!(f, Fault::Fail { operation: op, .. } if *op == operation))
        else {
            return Ok(());
        };
        match self.faults.remove(index) {
            Some(Fault::Fail { error, .. }) => Err(error),
            _ => Ok(()),
        }
    }

    /// Dequeue the first fault matching `predicate`.
    pub fn take_fault(&mut self, predicate: impl Fn(&Fault) -> bool) -> Option<Fault> {
        let index = self.faults.iter().position(predicate)?;
        self.faults.remove(index)
    }

    pub fn mark_write(&mut self, requires_commit: bool) {
        if requires_commit {
            self.pending_writes += 1;
        }
    }
}

#[derive(Debug)]
pub(crate) struct ZoneState {
    pub zone: Zone,
    pub entries: Vec<RecordEntry>,
    pub pools: BTreeSet<RecordSetKey>,
}

impl ZoneState {
    /// Store `entry` under a fresh reference.
    pub fn insert(&mut self, entry: &NewEntry) -> EntryRef {
        let entry_ref = EntryRef::new(uuid::Uuid::new_v4().to_string());
        self.entries.push(RecordEntry {
            entry_ref: entry_ref.clone(),
            name: entry.name.clone(),
            record_type: entry.record_type.clone(),
            qualifier: entry.qualifier.clone(),
            ttl: entry.ttl,
            rdata: entry.rdata.clone(),
            group: entry.group.clone(),
        });
        entry_ref
    }

    /// Remove one entry; its pool goes with the last entry of the set.
    pub fn remove(&mut self, entry: &EntryRef) -> bool {
        let Some(index) = self.entries.iter().position(|e| e.entry_ref == *entry) else {
            return false;
        };
        let key = self.entries.remove(index).key();
        if !self.entries.iter().any(|e| e.key() == key) {
            self.pools.remove(&key);
        }
        true
    }

    /// Entries grouped into record sets, in key order.
    ///
    /// TTL and group metadata come from the first entry of each set.
    pub fn record_sets(&self) -> Vec<ResourceRecordSet> {
        let mut grouped: BTreeMap<RecordSetKey, Vec<&RecordEntry>> = BTreeMap::new();
        for entry in &self.entries {
            grouped.entry(entry.key()).or_default().push(entry);
        }

        grouped
            .into_iter()
            .filter_map(|(key, entries)| {
                let first = entries.first()?;
                let mut builder = ResourceRecordSet::builder(&key.name, &key.record_type)
                    .ttl(first.ttl)
                    .add_all(entries.iter().map(|e| e.rdata.clone()));
                if let Some(q) = &key.qualifier {
                    builder = builder.qualifier(q);
                }
                if let Some(geo) = &first.group.geo {
                    builder = builder.geo(geo.clone());
                }
                if let Some(w) = first.group.weighted {
                    builder = builder.weight(w.weight);
                }
                match builder.build() {
                    Ok(rrset) => Some(rrset),
                    Err(e) => {
                        log::error!("[memory] Skipping malformed record set {key}: {e}");
                        None
                    }
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GroupMetadata, Rdata};

    fn zone_state() -> ZoneState {
        ZoneState {
            zone: Zone::new("example.com.", 3600, "hostmaster@example.com"),
            entries: Vec::new(),
            pools: BTreeSet::new(),
        }
    }

    fn entry(name: &str, address: &str) -> NewEntry {
        NewEntry {
            name: name.to_string(),
            record_type: "A".to_string(),
            qualifier: None,
            ttl: 300,
            rdata: Rdata::new().with("address", address),
            group: GroupMetadata::default(),
        }
    }

    #[test]
    fn record_sets_group_entries_by_key() {
        let mut state = zone_state();
        state.insert(&entry("www", "192.0.2.1"));
        state.insert(&entry("api", "192.0.2.9"));
        state.insert(&entry("www", "192.0.2.2"));

        let sets = state.record_sets();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets[0].name(), "api");
        assert_eq!(sets[1].records().len(), 2);
        assert_eq!(sets[1].ttl(), Some(300));
    }

    #[test]
    fn removing_last_entry_drops_pool() {
        let mut state = zone_state();
        let first = state.insert(&entry("www", "192.0.2.1"));
        let second = state.insert(&entry("www", "192.0.2.2"));
        state.pools.insert(RecordSetKey::new("www", "A"));

        assert!(state.remove(&first));
        assert_eq!(state.pools.len(), 1);
        assert!(state.remove(&second));
        assert!(state.pools.is_empty());
        assert!(!state.remove(&second));
    }

    #[test]
    fn fail_fault_fires_once_for_its_operation() {
        let mut store = Store::default();
        store.faults.push_back(Fault::Fail {
            operation: "commit",
            error: ProviderError::Timeout {
                provider: "memory".into(),
                detail: "slow".into(),
            },
        });

        assert!(store.record(BackendCall::ListZones).is_ok());
        assert!(
            store
                .record(BackendCall::Commit {
                    zone: "example.com.".into()
                })
                .is_err()
        );
        assert!(
            store
                .record(BackendCall::Commit {
                    zone: "example.com.".into()
                })
                .is_ok()
        );
        assert_eq!(store.calls.len(), 3);
    }

    #[test]
    fn zone_lookup_falls_back_to_name() {
        let mut store = Store::default();
        store.add_zone(Zone::new("example.com.", 3600, "hostmaster@example.com").with_id("Z1"));
        assert!(store.zone("Z1").is_some());
        assert!(store.zone("example.com.").is_some());
        assert!(store.zone_mut("example.com.").is_some());
        assert!(store.zone("other.com.").is_none());
    }
}
