//! Session token state machine
//!
//! [`next_action`] is a pure function of the cached state, the clock and the
//! current credentials. [`TokenCache`](crate::services::TokenCache) drives it.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use dns_reconciler_provider::Credentials;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Tokens this close to expiry are refreshed instead of reused.
pub const REFRESH_MARGIN_SECS: i64 = 60;

/// A token handed out by a [`TokenSource`](crate::traits::TokenSource).
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub value: String,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IssuedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Cached session token.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum TokenState {
    /// Never fetched.
    #[default]
    Unset,
    /// Issued for the credentials hashing to `credentials_hash`.
    Valid {
        value: String,
        expires_at: DateTime<Utc>,
        credentials_hash: String,
    },
    /// Rejected by the backend, or the last refresh failed.
    Invalid,
}

impl TokenState {
    pub fn issued(token: IssuedToken, credentials_hash: String) -> Self {
        Self::Valid {
            value: token.value,
            expires_at: token.expires_at,
            credentials_hash,
        }
    }
}

// 不打印 token 值
impl fmt::Debug for TokenState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unset => f.write_str("Unset"),
            Self::Valid { expires_at, .. } => f
                .debug_struct("Valid")
                .field("expires_at", expires_at)
                .finish_non_exhaustive(),
            Self::Invalid => f.write_str("Invalid"),
        }
    }
}

/// What to do before the next authenticated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenAction {
    /// Keep using this token.
    Reuse(String),
    /// Fetch a new token.
    Refresh,
}

/// Decide whether the cached token can be reused at `now`.
///
/// A token is reused only while it was issued for the same credentials and
/// stays valid for at least [`REFRESH_MARGIN_SECS`] more seconds.
pub fn next_action(state: &TokenState, now: DateTime<Utc>, credentials_hash: &str) -> TokenAction {
    match state {
        TokenState::Valid {
            value,
            expires_at,
            credentials_hash: issued_for,
        } if issued_for == credentials_hash
            && now + Duration::seconds(REFRESH_MARGIN_SECS) < *expires_at =>
        {
            TokenAction::Reuse(value.clone())
        }
        _ => TokenAction::Refresh,
    }
}

/// SHA-256 fingerprint of `credentials`, hex encoded.
pub fn credentials_hash(credentials: &Credentials) -> String {
    let mut hasher = Sha256::new();
    for (key, value) in credentials.iter() {
        hasher.update(key.as_bytes());
        hasher.update([0]);
        hasher.update(value.as_bytes());
        hasher.update([0]);
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn valid(expires_at: i64, hash: &str) -> TokenState {
        TokenState::Valid {
            value: "tok".to_string(),
            expires_at: at(expires_at),
            credentials_hash: hash.to_string(),
        }
    }

    #[test]
    fn unset_and_invalid_refresh() {
        assert_eq!(next_action(&TokenState::Unset, at(0), "h"), TokenAction::Refresh);
        assert_eq!(next_action(&TokenState::Invalid, at(0), "h"), TokenAction::Refresh);
    }

    #[test]
    fn fresh_token_reused() {
        assert_eq!(
            next_action(&valid(1_000, "h"), at(0), "h"),
            TokenAction::Reuse("tok".to_string())
        );
    }

    #[test]
    fn token_inside_margin_refreshed() {
        let state = valid(1_000, "h");
        assert_eq!(next_action(&state, at(1_000 - REFRESH_MARGIN_SECS), "h"), TokenAction::Refresh);
        assert_eq!(next_action(&state, at(2_000), "h"), TokenAction::Refresh);
    }

    #[test]
    fn changed_credentials_refresh() {
        assert_eq!(next_action(&valid(1_000, "old"), at(0), "new"), TokenAction::Refresh);
    }

    #[test]
    fn hash_depends_on_every_pair() {
        let base = Credentials::new().with("id", "ab").with("secret", "c");
        let shifted = Credentials::new().with("id", "a").with("secret", "bc");
        assert_ne!(credentials_hash(&base), credentials_hash(&shifted));
        assert_eq!(
            credentials_hash(&base),
            credentials_hash(&Credentials::new().with("secret", "c").with("id", "ab"))
        );
        assert_eq!(credentials_hash(&base).len(), 64);
    }

    #[test]
    fn debug_hides_token_value() {
        let rendered = format!("{:?}", valid(0, "h"));
        assert!(!rendered.contains("tok"));
        assert!(rendered.starts_with("Valid"));
    }
}
