//! DNS Reconciler Core Library
//!
//! The engine half of the record-set reconciliation library:
//! - Record-set reconciliation (`ReconciliationEngine`), for whole-set and record-by-record backends
//! - Region catalogs, region validation and region addition (`geo`)
//! - Directional record building (`GeoBuilder`) and the geo capability guard (`GeoSupport`)
//! - Backend registry and session token caching
//!
//! Backends are reached only through the `DnsBackend` trait of
//! `dns-reconciler-provider`; this crate never performs I/O of its own.
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use dns_reconciler_core::ReconciliationEngine;
//! use dns_reconciler_provider::{InMemoryBackend, RecordData, ResourceRecordSet, Zone};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(
//!     InMemoryBackend::builder()
//!         .zone(Zone::new("example.com.", 3600, "hostmaster@example.com"))
//!         .build(),
//! );
//! let engine = ReconciliationEngine::new(backend);
//!
//! let www = ResourceRecordSet::builder("www.example.com.", "A")
//!     .ttl(300)
//!     .add(RecordData::A { address: "192.0.2.1".to_string() })
//!     .build()?;
//! let report = engine.reconcile("example.com.", &www).await?;
//! assert_eq!(report.created, 1);
//! assert!(engine.reconcile("example.com.", &www).await?.is_noop());
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod geo;
pub mod services;
pub mod session;
pub mod traits;

#[cfg(test)]
mod test_utils;

// Re-export common types
pub use error::{CoreError, CoreResult};
pub use geo::{
    DirectionalGroup, DirectionalRecord, GeoBuilder, GeoHandle, GeoSupport, IndexedTerritories,
    RegionCatalog,
};
pub use services::{
    PlannedOp, ReconcileOptions, ReconcilePlan, ReconcileReport, ReconciliationEngine,
    ReconciliationEngineBuilder, TokenCache,
};
pub use session::{IssuedToken, TokenAction, TokenState};
pub use traits::{BackendRegistry, InMemoryBackendRegistry, TokenSource};
