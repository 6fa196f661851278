//! Region validation and region addition

use std::borrow::Cow;
use std::collections::BTreeSet;

use dns_reconciler_provider::{Geo, RegionMap, ResourceRecordSet};

use crate::error::{CoreError, CoreResult};

/// Check `proposed` against `supported`, all or nothing.
///
/// Unknown regions are reported before unknown territories, so the coarsest
/// violation always wins. Names in errors are sorted. Territories are compared
/// literally: a region name is not a territory unless the catalog lists it, so
/// whole-region selection goes through [`RegionCatalog::index`] first. Spelling
/// is never corrected.
///
/// [`RegionCatalog::index`]: crate::geo::RegionCatalog::index
pub fn validate_regions(proposed: &RegionMap, supported: &RegionMap) -> CoreResult<()> {
    let missing: Vec<String> = proposed
        .keys()
        .filter(|region| !supported.contains_key(*region))
        .cloned()
        .collect();
    if !missing.is_empty() {
        return Err(CoreError::UnsupportedRegion { regions: missing });
    }

    for (region, territories) in proposed {
        let Some(known) = supported.get(region) else {
            continue;
        };
        let unsupported: Vec<String> = territories
            .iter()
            .filter(|t| !known.contains(*t))
            .cloned()
            .collect();
        if !unsupported.is_empty() {
            return Err(CoreError::UnsupportedTerritory {
                region: region.clone(),
                territories: unsupported,
            });
        }
    }

    Ok(())
}

/// Merge `to_add` into the geo profile of `existing`.
///
/// New regions come in with exactly their listed territories; existing regions
/// gain the union. When nothing changes the original is handed back borrowed,
/// so callers can skip the write.
pub fn add_regions<'a>(
    existing: &'a ResourceRecordSet,
    to_add: &RegionMap,
) -> CoreResult<Cow<'a, ResourceRecordSet>> {
    let original = existing.geo().map(Geo::regions);
    let mut merged = original.cloned().unwrap_or_default();
    for (region, territories) in to_add {
        merged
            .entry(region.clone())
            .or_insert_with(BTreeSet::new)
            .extend(territories.iter().cloned());
    }

    let unchanged = match original {
        Some(original) => *original == merged,
        None => to_add.is_empty(),
    };
    if unchanged {
        return Ok(Cow::Borrowed(existing));
    }

    let updated = existing.with_geo(Geo::new(merged))?;
    log::debug!("Geo profile of {} now covers {:?}", existing.key(), updated.geo());
    Ok(Cow::Owned(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{a, regions};

    fn geo_set(geo: &RegionMap) -> ResourceRecordSet {
        ResourceRecordSet::builder("www.example.com.", "A")
            .qualifier("US")
            .ttl(300)
            .add(a("192.0.2.1"))
            .geo(geo.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn empty_proposal_always_validates() {
        assert!(validate_regions(&RegionMap::new(), &RegionMap::new()).is_ok());
        assert!(validate_regions(&RegionMap::new(), &regions(&[("Mexico", &["Mexico"])])).is_ok());
    }

    #[test]
    fn unknown_region_named() {
        let err = validate_regions(&regions(&[("R", &["t"])]), &RegionMap::new()).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRegion { regions } if regions == ["R"]));
    }

    #[test]
    fn unknown_regions_sorted_and_reported_before_territories() {
        let supported = regions(&[("Europe", &["France"])]);
        let proposed = regions(&[("Zeta", &["z"]), ("Alpha", &["a"]), ("Europe", &["Spain"])]);
        let err = validate_regions(&proposed, &supported).unwrap_err();
        assert!(matches!(err, CoreError::UnsupportedRegion { regions } if regions == ["Alpha", "Zeta"]));
    }

    #[test]
    fn misspelled_territory_not_corrected() {
        let err = validate_regions(
            &regions(&[("South America", &["Equador"])]),
            &regions(&[("South America", &["Ecuador"])]),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedTerritory { region, territories }
                if region == "South America" && territories == ["Equador"]
        ));
    }

    #[test]
    fn first_region_in_sorted_order_reported() {
        let supported = regions(&[("Europe", &["France"]), ("Asia", &["Japan"])]);
        let proposed = regions(&[("Europe", &["Narnia"]), ("Asia", &["Oz", "Mordor"])]);
        let err = validate_regions(&proposed, &supported).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedTerritory { region, territories }
                if region == "Asia" && territories == ["Mordor", "Oz"]
        ));
    }

    #[test]
    fn region_name_is_not_a_territory() {
        let supported = regions(&[("Europe", &["France"])]);
        let err = validate_regions(&regions(&[("Europe", &["Europe"])]), &supported).unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnsupportedTerritory { region, territories }
                if region == "Europe" && territories == ["Europe"]
        ));
    }

    #[test]
    fn region_name_expanded_by_catalog_validates() {
        let supported = regions(&[("Europe", &["France", "Germany"])]);
        let catalog = crate::geo::RegionCatalog::new(supported.clone());
        let indexed = catalog.index(["Europe"]);
        assert_eq!(indexed.regions, supported);
        assert!(validate_regions(&indexed.regions, &supported).is_ok());
    }

    #[test]
    fn adding_new_region_keeps_existing() {
        let rrset = geo_set(&regions(&[("US", &["Alaska", "Arizona"])]));
        let added = add_regions(&rrset, &regions(&[("Mexico", &["Mexico"])])).unwrap();

        assert!(matches!(added, Cow::Owned(_)));
        assert_eq!(
            added.geo().unwrap().regions(),
            &regions(&[("US", &["Alaska", "Arizona"]), ("Mexico", &["Mexico"])])
        );
        assert_eq!(added.key(), rrset.key());
        assert_eq!(added.ttl(), rrset.ttl());
        assert_eq!(added.records(), rrset.records());

        let again = add_regions(&added, &regions(&[("Mexico", &["Mexico"])])).unwrap();
        assert!(matches!(again, Cow::Borrowed(same) if std::ptr::eq(same, &*added)));
    }

    #[test]
    fn adding_to_existing_region_unions() {
        let rrset = geo_set(&regions(&[("US", &["Alaska"])]));
        let added = add_regions(&rrset, &regions(&[("US", &["Arizona"])])).unwrap();
        assert_eq!(
            added.geo().unwrap().regions(),
            &regions(&[("US", &["Alaska", "Arizona"])])
        );
    }

    #[test]
    fn adding_subset_is_noop() {
        let rrset = geo_set(&regions(&[("US", &["Alaska", "Arizona"])]));
        let added = add_regions(&rrset, &regions(&[("US", &["Alaska"])])).unwrap();
        assert!(matches!(added, Cow::Borrowed(_)));
        assert!(matches!(add_regions(&rrset, &RegionMap::new()), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn adding_to_unqualified_set_is_malformed() {
        let plain = ResourceRecordSet::builder("www", "A")
            .add(a("192.0.2.1"))
            .build()
            .unwrap();
        let err = add_regions(&plain, &regions(&[("Mexico", &["Mexico"])])).unwrap_err();
        assert!(matches!(err, CoreError::MalformedInput(_)));
    }
}
