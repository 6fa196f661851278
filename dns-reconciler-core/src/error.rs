//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

use dns_reconciler_provider::{Capability, InvalidRecordSet};

// Re-export library error type
pub use dns_reconciler_provider::{CredentialValidationError, ProviderError};

/// Core layer error type
#[derive(Error, Debug, Serialize)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// The zone itself does not exist (fatal for every operation on it)
    #[error("Zone not found: {0}")]
    ZoneNotFound(String),

    /// A record set the operation needs does not exist
    #[error("Record set not found: {0}")]
    RecordSetNotFound(String),

    /// No backend registered under this id
    #[error("Backend not found: {0}")]
    BackendNotFound(String),

    /// Proposed regions absent from the supported catalog (sorted)
    #[error("Unsupported regions: {}", .regions.join(", "))]
    UnsupportedRegion { regions: Vec<String> },

    /// Proposed territories absent from their region in the supported catalog (sorted)
    #[error("Unsupported territories in {region}: {}", .territories.join(", "))]
    UnsupportedTerritory {
        region: String,
        territories: Vec<String>,
    },

    /// The backend or account cannot serve a geo/weighted record set
    #[error("{capability} record sets are not available on {backend}")]
    CapabilityUnavailable {
        backend: String,
        capability: Capability,
    },

    /// A concurrent writer won a race the engine could not absorb
    #[error("Lost a concurrent write race on {key}: {detail}")]
    ConcurrencyLostRace { key: String, detail: String },

    /// Malformed caller input (record set, region JSON)
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// Credential validation errors (structured, supports field level errors)
    #[error("{0}")]
    CredentialValidation(#[from] CredentialValidationError),

    /// Provider error (converting from library)
    #[error("{0}")]
    Provider(#[from] ProviderError),
}

impl CoreError {
    /// 是否为预期行为（用户输入、资源不存在等），用于日志分级。
    ///
    /// 返回 `true` 时应使用 `warn` 级别，`false` 时使用 `error` 级别。
    /// **新增变体时请同步更新此方法。**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::ZoneNotFound(_)
            | Self::RecordSetNotFound(_)
            | Self::BackendNotFound(_)
            | Self::UnsupportedRegion { .. }
            | Self::UnsupportedTerritory { .. }
            | Self::CapabilityUnavailable { .. }
            | Self::MalformedInput(_)
            | Self::CredentialValidation(_) => true,
            Self::ConcurrencyLostRace { .. } => false,
            Self::Provider(e) => e.is_expected(),
        }
    }

    /// Log at `warn` when expected, `error` otherwise.
    pub(crate) fn log(&self, context: &str) {
        if self.is_expected() {
            log::warn!("{context}: {self}");
        } else {
            log::error!("{context}: {self}");
        }
    }
}

impl From<InvalidRecordSet> for CoreError {
    fn from(err: InvalidRecordSet) -> Self {
        Self::MalformedInput(err.to_string())
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_name_offenders() {
        let err = CoreError::UnsupportedTerritory {
            region: "South America".to_string(),
            territories: vec!["Equador".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Unsupported territories in South America: Equador"
        );
        assert!(err.is_expected());

        let err = CoreError::UnsupportedRegion {
            regions: vec!["Atlantis".to_string(), "Lemuria".to_string()],
        };
        assert_eq!(err.to_string(), "Unsupported regions: Atlantis, Lemuria");
    }

    #[test]
    fn serializes_with_code_and_details() {
        let err = CoreError::CapabilityUnavailable {
            backend: "memory".to_string(),
            capability: Capability::Geo,
        };
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "CapabilityUnavailable");
        assert_eq!(json["details"]["capability"], "geo");
        assert_eq!(err.to_string(), "geo record sets are not available on memory");
    }

    #[test]
    fn lost_race_is_unexpected() {
        let err = CoreError::ConcurrencyLostRace {
            key: "www/A".to_string(),
            detail: "entry vanished twice".to_string(),
        };
        assert!(!err.is_expected());
    }

    #[test]
    fn provider_errors_keep_their_expectation() {
        let err: CoreError = ProviderError::Timeout {
            provider: "memory".to_string(),
            detail: "30s".to_string(),
        }
        .into();
        assert!(!err.is_expected());
        assert_eq!(err.to_string(), "[memory] Request timeout: 30s");
    }
}
