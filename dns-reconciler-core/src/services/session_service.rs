//! 会话 Token 缓存服务

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dns_reconciler_provider::Credentials;
use tokio::sync::Mutex;

use crate::error::CoreResult;
use crate::session::{TokenAction, TokenState, credentials_hash, next_action};
use crate::traits::TokenSource;

struct Session {
    credentials: Credentials,
    credentials_hash: String,
    state: TokenState,
}

/// Caches one session token and refreshes it through a [`TokenSource`].
///
/// Concurrent callers queue on the cache lock, so at most one refresh runs at a time.
pub struct TokenCache {
    source: Arc<dyn TokenSource>,
    session: Mutex<Session>,
}

impl TokenCache {
    pub fn new(source: Arc<dyn TokenSource>, credentials: Credentials) -> Self {
        let credentials_hash = credentials_hash(&credentials);
        Self {
            source,
            session: Mutex::new(Session {
                credentials,
                credentials_hash,
                state: TokenState::Unset,
            }),
        }
    }

    /// A usable token, refreshed if needed.
    pub async fn token(&self) -> CoreResult<String> {
        self.token_at(Utc::now()).await
    }

    /// [`token`](Self::token) with an explicit clock.
    pub async fn token_at(&self, now: DateTime<Utc>) -> CoreResult<String> {
        let mut session = self.session.lock().await;
        if let TokenAction::Reuse(value) = next_action(&session.state, now, &session.credentials_hash) {
            return Ok(value);
        }

        log::debug!("Refreshing session token");
        match self.source.issue(&session.credentials).await {
            Ok(issued) => {
                let value = issued.value.clone();
                session.state = TokenState::issued(issued, session.credentials_hash.clone());
                Ok(value)
            }
            Err(e) => {
                e.log("Session token refresh failed");
                session.state = TokenState::Invalid;
                Err(e)
            }
        }
    }

    /// Drop the cached token, e.g. after the backend rejected it.
    pub async fn invalidate(&self) {
        self.session.lock().await.state = TokenState::Invalid;
    }

    /// Switch credentials. The cached token is refreshed on next use.
    pub async fn set_credentials(&self, credentials: Credentials) {
        let mut session = self.session.lock().await;
        session.credentials_hash = credentials_hash(&credentials);
        session.credentials = credentials;
    }

    pub async fn state(&self) -> TokenState {
        self.session.lock().await.state.clone()
    }
}
