//! Region catalogs, region validation, directional record building and the
//! geo capability guard.

mod builder;
mod catalog;
mod support;
mod validator;

pub use builder::{DirectionalGroup, DirectionalRecord, GeoBuilder};
pub use catalog::{IndexedTerritories, RegionCatalog, parse_region_map};
pub use support::{GeoHandle, GeoSupport};
pub use validator::{add_regions, validate_regions};
