//! Region catalog: the territory ↔ region index of one backend

use std::collections::{BTreeSet, HashMap};

use dns_reconciler_provider::{Geo, RegionMap};
use serde::Serialize;

use crate::error::{CoreError, CoreResult};
use crate::geo::validator::validate_regions;

/// A backend's supported regions, indexed both ways.
///
/// Built once per backend session and never mutated; share it through `Arc`.
/// Every territory resolves to exactly one owning region. When a catalog lists a
/// territory under two regions, the alphabetically later region wins and a
/// warning is logged; declaration order is not kept, even for JSON catalogs.
/// Region names resolve to themselves, so [`index`](Self::index) expands a region
/// name into the whole region. Validation never does.
#[derive(Debug, Clone, Default)]
pub struct RegionCatalog {
    regions: RegionMap,
    owners: HashMap<String, String>,
}

/// A raw territory list grouped by owning region.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexedTerritories {
    /// Recognised territories, by region.
    pub regions: RegionMap,
    /// Codes the catalog does not know, in input order.
    pub unknown: Vec<String>,
}

impl IndexedTerritories {
    /// The recognised part as a geo profile.
    pub fn into_geo(self) -> Geo {
        Geo::new(self.regions)
    }
}

impl RegionCatalog {
    /// Index `regions`.
    pub fn new(regions: RegionMap) -> Self {
        let territory_count: usize = regions.values().map(BTreeSet::len).sum();
        let mut owners = HashMap::with_capacity(territory_count + regions.len());

        for (region, territories) in &regions {
            for territory in territories {
                if let Some(previous) = owners.insert(territory.clone(), region.clone())
                    && previous != *region
                {
                    log::warn!(
                        "Territory '{territory}' is listed under both '{previous}' and '{region}', using '{region}'"
                    );
                }
            }
        }
        // 区域名自映射（整区选择）
        for region in regions.keys() {
            owners
                .entry(region.clone())
                .or_insert_with(|| region.clone());
        }

        log::debug!(
            "Indexed {} regions with {territory_count} territories",
            regions.len()
        );
        Self { regions, owners }
    }

    /// Parse a `{"region": ["territory", ...]}` JSON catalog.
    pub fn from_json(json: &str) -> CoreResult<Self> {
        parse_region_map(json).map(Self::new)
    }

    /// The full catalog.
    pub fn supported_regions(&self) -> &RegionMap {
        &self.regions
    }

    /// Region owning `code` (a territory, or a region name itself).
    pub fn region_of(&self, code: &str) -> Option<&str> {
        self.owners.get(code).map(String::as_str)
    }

    /// Territories of `region`.
    pub fn territories(&self, region: &str) -> Option<&BTreeSet<String>> {
        self.regions.get(region)
    }

    /// Whether `region` is in the catalog.
    pub fn contains_region(&self, region: &str) -> bool {
        self.regions.contains_key(region)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Group a raw territory list into regions.
    ///
    /// A region name selects every territory of that region. Unknown codes are
    /// set aside in [`IndexedTerritories::unknown`].
    pub fn index<I, S>(&self, codes: I) -> IndexedTerritories
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut indexed = IndexedTerritories::default();
        for code in codes {
            let code = code.as_ref();
            if let Some(territories) = self.regions.get(code) {
                indexed
                    .regions
                    .entry(code.to_string())
                    .or_default()
                    .extend(territories.iter().cloned());
            } else if let Some(region) = self.owners.get(code) {
                indexed
                    .regions
                    .entry(region.clone())
                    .or_default()
                    .insert(code.to_string());
            } else {
                indexed.unknown.push(code.to_string());
            }
        }
        indexed
    }

    /// Check a proposed region map against this catalog.
    pub fn validate(&self, proposed: &RegionMap) -> CoreResult<()> {
        validate_regions(proposed, &self.regions)
    }
}

impl From<RegionMap> for RegionCatalog {
    fn from(regions: RegionMap) -> Self {
        Self::new(regions)
    }
}

/// Parse a `{"region": ["territory", ...]}` JSON map.
pub fn parse_region_map(json: &str) -> CoreResult<RegionMap> {
    serde_json::from_str(json)
        .map_err(|e| CoreError::MalformedInput(format!("region map is not valid JSON: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::regions;

    fn catalog() -> RegionCatalog {
        RegionCatalog::new(regions(&[
            ("Europe", &["France", "Germany"]),
            ("Mexico", &["Mexico"]),
            ("South America", &["Brazil", "Ecuador"]),
        ]))
    }

    #[test]
    fn territories_and_regions_resolve() {
        let catalog = catalog();
        assert_eq!(catalog.region_of("Ecuador"), Some("South America"));
        assert_eq!(catalog.region_of("Europe"), Some("Europe"));
        assert_eq!(catalog.region_of("Mexico"), Some("Mexico"));
        assert_eq!(catalog.region_of("Atlantis"), None);
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn duplicate_territory_resolves_to_later_region() {
        let catalog = RegionCatalog::new(regions(&[
            ("Americas", &["Mexico"]),
            ("North America", &["Mexico", "Canada"]),
        ]));
        assert_eq!(catalog.region_of("Mexico"), Some("North America"));
        // 正向映射保持原样
        assert!(catalog.territories("Americas").unwrap().contains("Mexico"));
    }

    #[test]
    fn duplicate_territory_ignores_declaration_order() {
        let catalog =
            RegionCatalog::from_json(r#"{"Zulu": ["Mexico"], "Alpha": ["Mexico"]}"#).unwrap();
        assert_eq!(catalog.region_of("Mexico"), Some("Zulu"));
    }

    #[test]
    fn index_groups_codes_and_sets_unknown_aside() {
        let indexed = catalog().index(["Germany", "Brazil", "Ecuador", "Equador", "Europe"]);
        assert_eq!(
            indexed.regions,
            regions(&[
                ("Europe", &["France", "Germany"]),
                ("South America", &["Brazil", "Ecuador"]),
            ])
        );
        assert_eq!(indexed.unknown, vec!["Equador".to_string()]);
    }

    #[test]
    fn index_of_nothing_is_empty() {
        let indexed = catalog().index(Vec::<String>::new());
        assert!(indexed.regions.is_empty());
        assert!(indexed.into_geo().is_empty());
    }

    #[test]
    fn from_json_parses_catalog() {
        let catalog =
            RegionCatalog::from_json(r#"{"Mexico": ["Mexico"], "Europe": ["France"]}"#).unwrap();
        assert!(catalog.contains_region("Europe"));
        assert_eq!(catalog.region_of("France"), Some("Europe"));
    }

    #[test]
    fn from_json_rejects_garbage() {
        let err = RegionCatalog::from_json("{\"Mexico\": \"Mexico\"").unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
        assert!(parse_region_map("[]").is_err());
    }
}
