//! Caller-supplied collaborators

mod backend_registry;
mod token_source;

pub use backend_registry::{BackendRegistry, InMemoryBackendRegistry};
pub use token_source::TokenSource;
