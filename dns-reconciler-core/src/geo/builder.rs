//! Turns provider-native directional records into canonical record sets.

use std::collections::HashMap;
use std::mem;
use std::sync::Arc;

use dns_reconciler_provider::{
    Geo, Rdata, RecordSetKey, ResourceRecordSet, ResourceRecordSetBuilder,
};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::geo::catalog::RegionCatalog;

/// A provider's named group of territories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalGroup {
    /// Group label, which becomes the record set's qualifier.
    pub name: String,
    /// Raw territory codes or region names.
    pub territories: Vec<String>,
}

/// One provider-native record, possibly tied to a directional group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub record_type: String,
    #[serde(default)]
    pub ttl: Option<u32>,
    pub rdata: Rdata,
    #[serde(default)]
    pub group: Option<DirectionalGroup>,
    #[serde(default)]
    pub weight: Option<u32>,
    /// Provider label of the record; qualifies ungrouped weighted records.
    #[serde(default)]
    pub label: Option<String>,
}

impl DirectionalRecord {
    fn qualifier(&self) -> Option<&str> {
        match (&self.group, self.weight) {
            (Some(group), _) => Some(&group.name),
            (None, Some(_)) => self.label.as_deref(),
            (None, None) => None,
        }
    }
}

/// Builds record sets against a shared [`RegionCatalog`].
#[derive(Debug, Clone)]
pub struct GeoBuilder {
    catalog: Arc<RegionCatalog>,
}

impl GeoBuilder {
    pub fn new(catalog: Arc<RegionCatalog>) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Geo profile for a raw territory list. Unknown codes are dropped.
    pub fn geo_for<I, S>(&self, territories: I) -> Geo
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let indexed = self.catalog.index(territories);
        if !indexed.unknown.is_empty() {
            log::warn!(
                "Dropping territories unknown to the region catalog: {}",
                indexed.unknown.join(", ")
            );
        }
        indexed.into_geo()
    }

    /// Group `records` into record sets, in order of first appearance.
    ///
    /// The first record of each group supplies the ttl, geo and weight.
    pub fn build<I>(&self, records: I) -> CoreResult<Vec<ResourceRecordSet>>
    where
        I: IntoIterator<Item = DirectionalRecord>,
    {
        let mut order: Vec<ResourceRecordSetBuilder> = Vec::new();
        let mut index: HashMap<RecordSetKey, usize> = HashMap::new();

        for record in records {
            let mut key = RecordSetKey::new(record.name.trim(), record.record_type.trim());
            key.qualifier = record.qualifier().map(str::to_string);

            let slot = match index.get(&key) {
                Some(&slot) => slot,
                None => {
                    order.push(self.start(&record, &key));
                    index.insert(key, order.len() - 1);
                    order.len() - 1
                }
            };
            order[slot] = mem::take(&mut order[slot]).add(record.rdata);
        }

        let rrsets = order
            .into_iter()
            .map(ResourceRecordSetBuilder::build)
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!("Built {} record sets from directional records", rrsets.len());
        Ok(rrsets)
    }

    fn start(&self, record: &DirectionalRecord, key: &RecordSetKey) -> ResourceRecordSetBuilder {
        let mut builder =
            ResourceRecordSet::builder(&key.name, &key.record_type).ttl_opt(record.ttl);
        if let Some(qualifier) = &key.qualifier {
            builder = builder.qualifier(qualifier);
        }
        if let Some(group) = &record.group {
            builder = builder.geo(self.geo_for(&group.territories));
        }
        if let Some(weight) = record.weight {
            builder = builder.weight(weight);
        }
        builder
    }
}
