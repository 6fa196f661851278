//! Pure diffing of desired record sets against remote state.
//!
//! Nothing in here talks to a backend. The engine reads current state, hands
//! it to one of these functions and applies the resulting [`ReconcilePlan`].

use dns_reconciler_provider::{
    BackendCapabilities, EntryRef, EntryUpdate, GroupMetadata, NewEntry, Rdata, RecordEntry,
    RecordSetKey, ResourceRecordSet,
};
use serde::Serialize;

/// One backend call the engine intends to make.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", content = "target", rename_all = "camelCase")]
pub enum PlannedOp {
    /// Whole-set replace.
    ReplaceSet(ResourceRecordSet),
    /// Whole-set delete.
    DeleteSet(RecordSetKey),
    /// Create the grouping pool before the first entry.
    CreatePool(RecordSetKey),
    Create(NewEntry),
    /// In-place metadata update. `recreate` is what to create if the entry
    /// vanished in the meantime.
    Update {
        entry: EntryRef,
        update: EntryUpdate,
        recreate: NewEntry,
    },
    Delete(EntryRef),
    /// Publish pending writes. Skipped at apply time when nothing was written.
    Commit,
}

impl PlannedOp {
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Commit)
    }
}

/// Ordered operations reconciling one record set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcilePlan {
    pub key: RecordSetKey,
    pub ops: Vec<PlannedOp>,
}

impl ReconcilePlan {
    fn new(key: RecordSetKey) -> Self {
        Self {
            key,
            ops: Vec::new(),
        }
    }

    /// Whether applying the plan would write nothing.
    pub fn is_empty(&self) -> bool {
        !self.ops.iter().any(PlannedOp::is_write)
    }

    /// Number of planned writes, commit excluded.
    pub fn write_count(&self) -> usize {
        self.ops.iter().filter(|op| op.is_write()).count()
    }

    fn finish(mut self, capabilities: &BackendCapabilities) -> Self {
        if capabilities.requires_commit && !self.is_empty() {
            self.ops.push(PlannedOp::Commit);
        }
        self
    }
}

/// Whether `current` already satisfies `desired`.
///
/// The ttl only counts when `desired` sets one.
pub fn satisfies(current: &ResourceRecordSet, desired: &ResourceRecordSet) -> bool {
    current.key() == desired.key()
        && current.records().len() == desired.records().len()
        && desired.records().iter().all(|r| current.contains(r))
        && current.geo() == desired.geo()
        && current.weighted() == desired.weighted()
        && desired.ttl().is_none_or(|ttl| current.ttl() == Some(ttl))
}

/// Plan for a backend with native whole-set replace.
pub fn replace_set(
    desired: &ResourceRecordSet,
    current: Option<&ResourceRecordSet>,
    capabilities: &BackendCapabilities,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::new(desired.key());
    if desired.records().is_empty() {
        if current.is_some() {
            plan.ops.push(PlannedOp::DeleteSet(desired.key()));
        }
    } else if !current.is_some_and(|current| satisfies(current, desired)) {
        // 未指定 ttl 时沿用现有值
        let replacement = match (desired.ttl(), current) {
            (None, Some(current)) => desired.with_ttl(current.ttl()),
            _ => desired.clone(),
        };
        plan.ops.push(PlannedOp::ReplaceSet(replacement));
    }
    plan.finish(capabilities)
}

/// Plan removing a whole set from a whole-set backend.
pub fn delete_set(
    key: &RecordSetKey,
    current: Option<&ResourceRecordSet>,
    capabilities: &BackendCapabilities,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::new(key.clone());
    if current.is_some() {
        plan.ops.push(PlannedOp::DeleteSet(key.clone()));
    }
    plan.finish(capabilities)
}

/// Plan for a record-by-record backend.
///
/// `ttl` is the effective ttl of `desired` (its own, or the zone default).
/// Operations come out as updates, deletes, pool creation, creates, commit.
pub fn per_entry(
    desired: &ResourceRecordSet,
    ttl: u32,
    current: &[RecordEntry],
    capabilities: &BackendCapabilities,
) -> ReconcilePlan {
    let group = GroupMetadata::of(desired);
    let mut kept: Vec<&Rdata> = Vec::new();
    let mut survivors = 0usize;
    let mut updates = Vec::new();
    let mut deletes = Vec::new();
    let mut creates = Vec::new();

    for entry in current {
        // 远端重复条目只保留第一条
        if !desired.contains(&entry.rdata) || kept.contains(&&entry.rdata) {
            deletes.push(PlannedOp::Delete(entry.entry_ref.clone()));
            continue;
        }
        kept.push(&entry.rdata);

        let ttl_differs = entry.ttl != ttl;
        let group_differs = entry.group != group;
        if !ttl_differs && !group_differs {
            survivors += 1;
            continue;
        }

        let recreate = NewEntry::for_record_set(desired, entry.rdata.clone(), ttl);
        if capabilities.entry_metadata_update {
            survivors += 1;
            updates.push(PlannedOp::Update {
                entry: entry.entry_ref.clone(),
                update: EntryUpdate {
                    ttl: ttl_differs.then_some(ttl),
                    rdata: None,
                    group: group_differs.then(|| group.clone()),
                },
                recreate,
            });
        } else {
            deletes.push(PlannedOp::Delete(entry.entry_ref.clone()));
            creates.push(PlannedOp::Create(recreate));
        }
    }

    for rdata in desired.records() {
        if !kept.contains(&rdata) {
            creates.push(PlannedOp::Create(NewEntry::for_record_set(
                desired,
                rdata.clone(),
                ttl,
            )));
        }
    }

    let mut plan = ReconcilePlan::new(desired.key());
    plan.ops.extend(updates);
    plan.ops.extend(deletes);
    if capabilities.requires_pool && survivors == 0 && !creates.is_empty() {
        plan.ops.push(PlannedOp::CreatePool(desired.key()));
    }
    plan.ops.extend(creates);
    plan.finish(capabilities)
}

/// Plan deleting every listed entry of `key`.
pub fn delete_entries(
    key: &RecordSetKey,
    current: &[RecordEntry],
    capabilities: &BackendCapabilities,
) -> ReconcilePlan {
    let mut plan = ReconcilePlan::new(key.clone());
    plan.ops.extend(
        current
            .iter()
            .map(|entry| PlannedOp::Delete(entry.entry_ref.clone())),
    );
    plan.finish(capabilities)
}
