use serde::{Deserialize, Serialize};

/// Unified error type for all backend operations.
///
/// Each variant includes a `provider` field identifying which backend produced the error,
/// plus variant-specific context. All variants are serializable for structured error reporting.
///
/// # Not-found asymmetry
///
/// [`ZoneNotFound`](Self::ZoneNotFound) and [`RecordNotFound`](Self::RecordNotFound) are kept
/// apart on purpose: the reconciliation engine treats a missing zone as fatal but a missing
/// record set (while reading current state) as an empty result.
///
/// # Retryable Errors
///
/// The following variants represent transient failures that may succeed on retry:
/// - [`NetworkError`](Self::NetworkError): network connectivity issues
/// - [`Timeout`](Self::Timeout): request timed out
/// - [`RateLimited`](Self::RateLimited): API rate limit exceeded
///
/// Retrying them is a transport concern; the engine never loops on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "code")]
pub enum ProviderError {
    /// A network-level error occurred (DNS resolution failure, connection refused, etc.).
    NetworkError {
        /// Backend that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The provided credentials are invalid or expired.
    InvalidCredentials {
        /// Backend that produced the error.
        provider: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// A record entry or pool with the same identity already exists.
    RecordExists {
        /// Backend that produced the error.
        provider: String,
        /// Name of the conflicting record.
        record_name: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The specified record entry or record set was not found.
    RecordNotFound {
        /// Backend that produced the error.
        provider: String,
        /// Reference of the record that was not found.
        record_id: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The specified zone was not found.
    ZoneNotFound {
        /// Backend that produced the error.
        provider: String,
        /// Zone id or name that was not found.
        zone: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// A request parameter is invalid (e.g., bad TTL value, malformed cursor).
    InvalidParameter {
        /// Backend that produced the error.
        provider: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of what's wrong.
        detail: String,
    },

    /// The requested record type is not supported by this backend.
    UnsupportedRecordType {
        /// Backend that produced the error.
        provider: String,
        /// The unsupported record type string.
        record_type: String,
    },

    /// The API rate limit has been exceeded (HTTP 429 or equivalent).
    RateLimited {
        /// Backend that produced the error.
        provider: String,
        /// Suggested wait time in seconds before retrying, if provided by the API.
        retry_after: Option<u64>,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The request timed out.
    Timeout {
        /// Backend that produced the error.
        provider: String,
        /// Error details.
        detail: String,
    },

    /// The authenticated account lacks permission for the requested operation.
    PermissionDenied {
        /// Backend that produced the error.
        provider: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// An optional feature (directional DNS, weighted pools) is not enabled for the account.
    ///
    /// Capability probes convert this into "feature absent" rather than failing.
    FeatureNotEnabled {
        /// Backend that produced the error.
        provider: String,
        /// Feature that was probed.
        feature: String,
        /// Original error message from the backend, if available.
        raw_message: Option<String>,
    },

    /// The backend does not implement the requested operation at all.
    Unsupported {
        /// Backend that produced the error.
        provider: String,
        /// Operation name.
        operation: String,
    },

    /// Failed to parse the backend's response.
    ParseError {
        /// Backend that produced the error.
        provider: String,
        /// Details about the parse failure.
        detail: String,
    },

    /// An unrecognized error from the backend.
    ///
    /// This is a catch-all for error codes not yet mapped to a specific variant.
    Unknown {
        /// Backend that produced the error.
        provider: String,
        /// Raw error code from the API, if available.
        raw_code: Option<String>,
        /// Raw error message from the API.
        raw_message: String,
    },
}

impl ProviderError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials { .. }
                | Self::RecordExists { .. }
                | Self::RecordNotFound { .. }
                | Self::ZoneNotFound { .. }
                | Self::InvalidParameter { .. }
                | Self::UnsupportedRecordType { .. }
                | Self::PermissionDenied { .. }
                | Self::FeatureNotEnabled { .. }
                | Self::Unsupported { .. }
        )
    }

    /// Whether this error is a transient transport failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError { .. } | Self::Timeout { .. } | Self::RateLimited { .. }
        )
    }

    /// The backend identifier carried by every variant.
    pub fn provider(&self) -> &str {
        match self {
            Self::NetworkError { provider, .. }
            | Self::InvalidCredentials { provider, .. }
            | Self::RecordExists { provider, .. }
            | Self::RecordNotFound { provider, .. }
            | Self::ZoneNotFound { provider, .. }
            | Self::InvalidParameter { provider, .. }
            | Self::UnsupportedRecordType { provider, .. }
            | Self::RateLimited { provider, .. }
            | Self::Timeout { provider, .. }
            | Self::PermissionDenied { provider, .. }
            | Self::FeatureNotEnabled { provider, .. }
            | Self::Unsupported { provider, .. }
            | Self::ParseError { provider, .. }
            | Self::Unknown { provider, .. } => provider,
        }
    }
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NetworkError { provider, detail } => {
                write!(f, "[{provider}] Network error: {detail}")
            }
            Self::InvalidCredentials {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Invalid credentials: {msg}")
                } else {
                    write!(f, "[{provider}] Invalid credentials")
                }
            }
            Self::RecordExists {
                provider,
                record_name,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_name}' already exists")
            }
            Self::RecordNotFound {
                provider,
                record_id,
                ..
            } => {
                write!(f, "[{provider}] Record '{record_id}' not found")
            }
            Self::ZoneNotFound {
                provider,
                zone,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Zone '{zone}' not found: {msg}")
                } else {
                    write!(f, "[{provider}] Zone '{zone}' not found")
                }
            }
            Self::InvalidParameter {
                provider,
                param,
                detail,
            } => {
                write!(f, "[{provider}] Invalid parameter '{param}': {detail}")
            }
            Self::UnsupportedRecordType {
                provider,
                record_type,
            } => {
                write!(f, "[{provider}] Unsupported record type: {record_type}")
            }
            Self::RateLimited {
                provider,
                retry_after,
                ..
            } => {
                if let Some(secs) = retry_after {
                    write!(f, "[{provider}] Rate limited (retry after {secs}s)")
                } else {
                    write!(f, "[{provider}] Rate limited")
                }
            }
            Self::Timeout { provider, detail } => {
                write!(f, "[{provider}] Request timeout: {detail}")
            }
            Self::PermissionDenied {
                provider,
                raw_message,
            } => {
                if let Some(msg) = raw_message {
                    write!(f, "[{provider}] Permission denied: {msg}")
                } else {
                    write!(f, "[{provider}] Permission denied")
                }
            }
            Self::FeatureNotEnabled {
                provider, feature, ..
            } => {
                write!(f, "[{provider}] Feature '{feature}' is not enabled")
            }
            Self::Unsupported {
                provider,
                operation,
            } => {
                write!(f, "[{provider}] Operation '{operation}' is not supported")
            }
            Self::ParseError { provider, detail } => {
                write!(f, "[{provider}] Parse error: {detail}")
            }
            Self::Unknown {
                provider,
                raw_message,
                ..
            } => {
                write!(f, "[{provider}] {raw_message}")
            }
        }
    }
}

impl std::error::Error for ProviderError {}

/// Convenience type alias for `Result<T, ProviderError>`.
pub type Result<T> = std::result::Result<T, ProviderError>;
