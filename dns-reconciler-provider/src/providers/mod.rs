//! Backend implementations

#[cfg(feature = "memory")]
mod memory;

#[cfg(feature = "memory")]
pub use memory::{BackendCall, Fault, InMemoryBackend, InMemoryBackendBuilder, default_regions};
