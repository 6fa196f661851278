//! # dns-reconciler-provider
//!
//! The backend-facing half of a DNS record-set reconciliation library: the
//! record-set data model, the unified error taxonomy, the [`DnsBackend`] trait
//! every provider adapter implements, and [`PagedSequence`], which turns a
//! provider's page-at-a-time listings into one lazy stream.
//!
//! ## Feature Flags
//!
//! - **`memory`** *(default)*: the [`InMemoryBackend`] reference backend. It
//!   honours every [`BackendCapabilities`] combination and records each call,
//!   which makes it the backend of choice for tests and dry runs.
//!
//! ## Usage
//!
//! ```rust
//! use dns_reconciler_provider::{
//!     DnsBackend, InMemoryBackend, RecordData, RecordSetFilter, ResourceRecordSet, Zone,
//! };
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = InMemoryBackend::builder()
//!     .zone(Zone::new("example.com.", 3600, "hostmaster@example.com"))
//!     .build();
//!
//! let www = ResourceRecordSet::builder("www.example.com.", "A")
//!     .ttl(300)
//!     .add(RecordData::A { address: "192.0.2.1".to_string() })
//!     .build()?;
//! backend.seed("example.com.", &www).await?;
//!
//! let page = backend
//!     .list_record_sets("example.com.", &RecordSetFilter::default(), None)
//!     .await?;
//! assert_eq!(page.items, vec![www]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All backend operations return [`Result<T, ProviderError>`](ProviderError).
//! The error enum provides structured variants for common failure modes:
//!
//! - [`ProviderError::ZoneNotFound`]: the zone itself is absent
//! - [`ProviderError::RecordNotFound`]: an entry or record set is absent
//! - [`ProviderError::RecordExists`]: a create collided with an existing entry
//! - [`ProviderError::FeatureNotEnabled`]: an optional feature is off for the account
//!
//! Transient errors (`NetworkError`, `Timeout`, `RateLimited`) are reported by
//! [`ProviderError::is_retryable`]; retrying them belongs to the transport.

mod error;
mod factory;
mod paging;
mod providers;
mod traits;
mod types;
pub mod utils;

// Re-export error types
pub use error::{ProviderError, Result};

// Re-export factories
#[cfg(feature = "memory")]
pub use factory::InMemoryBackendFactory;
pub use factory::{BackendFactory, builtin_factories, get_all_backend_metadata};

// Re-export the backend trait (internal error-mapping traits are not exported)
pub use traits::DnsBackend;

pub use paging::PagedSequence;

// Re-export types
pub use types::{
    BackendCapabilities, BackendLimits, BackendMetadata, Capability, CredentialField,
    CredentialValidationError, Credentials, EntryRef, EntryUpdate, FieldType, Geo, GroupMetadata,
    InvalidRecordSet, MAX_WEIGHT, NewEntry, Page, PagePointer, Rdata, RecordData, RecordEntry,
    RecordSetFilter, RecordSetKey, RegionMap, ResourceRecordSet, ResourceRecordSetBuilder,
    Weighted, WriteMode, Zone,
};

// Re-export concrete backends (behind feature flags)
#[cfg(feature = "memory")]
pub use providers::{BackendCall, Fault, InMemoryBackend, InMemoryBackendBuilder, default_regions};
