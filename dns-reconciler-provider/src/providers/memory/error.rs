//! 内存后端错误映射
//!
//! 内部错误码：
//!
//! - `zone.not_found` → `ZoneNotFound`
//! - `record.not_found` / `pool.not_found` → `RecordNotFound`
//! - `record.exists` / `pool.exists` → `RecordExists`
//! - `feature.not_enabled` → `FeatureNotEnabled`
//! - `cursor.invalid` → `InvalidParameter`
//! - `operation.unsupported` → `Unsupported`

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::{InMemoryBackend, MEMORY_PROVIDER_ID};

impl ProviderErrorMapper for InMemoryBackend {
    fn provider_name(&self) -> &'static str {
        MEMORY_PROVIDER_ID
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        let provider = self.provider_name().to_string();
        match raw.code.as_deref() {
            Some("zone.not_found") => ProviderError::ZoneNotFound {
                provider,
                zone: context.zone.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some("record.not_found" | "pool.not_found") => ProviderError::RecordNotFound {
                provider,
                record_id: context.entry_ref.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some("record.exists" | "pool.exists") => ProviderError::RecordExists {
                provider,
                record_name: context.record_name.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some("feature.not_enabled") => ProviderError::FeatureNotEnabled {
                provider,
                feature: context.feature.unwrap_or_default(),
                raw_message: Some(raw.message),
            },
            Some("cursor.invalid") => ProviderError::InvalidParameter {
                provider,
                param: "cursor".to_string(),
                detail: raw.message,
            },
            Some("operation.unsupported") => ProviderError::Unsupported {
                provider,
                operation: raw.message,
            },
            _ => self.unknown_error(raw),
        }
    }
}

impl InMemoryBackend {
    pub(crate) fn zone_not_found(&self, zone: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code("zone.not_found", format!("no such zone: {zone}")),
            ErrorContext {
                zone: Some(zone.to_string()),
                ..Default::default()
            },
        )
    }

    pub(crate) fn record_not_found(&self, id: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code("record.not_found", format!("nothing stored under {id}")),
            ErrorContext {
                entry_ref: Some(id.to_string()),
                ..Default::default()
            },
        )
    }

    pub(crate) fn pool_not_found(&self, key: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code("pool.not_found", format!("no pool for {key}")),
            ErrorContext {
                entry_ref: Some(key.to_string()),
                ..Default::default()
            },
        )
    }

    pub(crate) fn record_exists(&self, name: &str, code: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code(code, format!("{name} already stored")),
            ErrorContext {
                record_name: Some(name.to_string()),
                ..Default::default()
            },
        )
    }

    pub(crate) fn feature_not_enabled(&self, feature: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code(
                "feature.not_enabled",
                format!("{feature} is not enabled for this account"),
            ),
            ErrorContext {
                feature: Some(feature.to_string()),
                ..Default::default()
            },
        )
    }

    pub(crate) fn invalid_cursor(&self, detail: impl Into<String>) -> ProviderError {
        self.map_error(
            RawApiError::with_code("cursor.invalid", detail),
            ErrorContext::default(),
        )
    }

    pub(crate) fn unsupported(&self, operation: &str) -> ProviderError {
        self.map_error(
            RawApiError::with_code("operation.unsupported", operation),
            ErrorContext::default(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_not_found_codes() {
        let backend = InMemoryBackend::new();
        assert!(matches!(
            backend.zone_not_found("example.com."),
            ProviderError::ZoneNotFound { zone, .. } if zone == "example.com."
        ));
        assert!(matches!(
            backend.pool_not_found("www/A"),
            ProviderError::RecordNotFound { record_id, .. } if record_id == "www/A"
        ));
    }

    #[test]
    fn maps_exists_and_feature_codes() {
        let backend = InMemoryBackend::new();
        assert!(matches!(
            backend.record_exists("www", "pool.exists"),
            ProviderError::RecordExists { record_name, .. } if record_name == "www"
        ));
        let err = backend.feature_not_enabled("geo");
        assert!(err.is_expected());
        assert_eq!(err.to_string(), "[memory] Feature 'geo' is not enabled");
    }

    #[test]
    fn unmapped_code_falls_back_to_unknown() {
        let backend = InMemoryBackend::new();
        let err = backend.map_error(
            RawApiError::with_code("disk.full", "no space"),
            ErrorContext::default(),
        );
        assert!(matches!(
            err,
            ProviderError::Unknown { raw_code: Some(code), .. } if code == "disk.full"
        ));
    }
}
