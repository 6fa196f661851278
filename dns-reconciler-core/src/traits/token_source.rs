//! Session token issuing abstract Trait

use async_trait::async_trait;
use dns_reconciler_provider::Credentials;

use crate::error::CoreResult;
use crate::session::IssuedToken;

/// Exchanges credentials for a short-lived session token.
///
/// Implemented by the transport layer; the core only decides when to call it.
#[async_trait]
pub trait TokenSource: Send + Sync {
    /// Issue a fresh token for `credentials`
    async fn issue(&self, credentials: &Credentials) -> CoreResult<IssuedToken>;
}
