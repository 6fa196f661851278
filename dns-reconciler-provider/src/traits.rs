use async_trait::async_trait;

use crate::error::{ProviderError, Result};
use crate::types::{
    BackendCapabilities, BackendMetadata, Capability, EntryRef, EntryUpdate, NewEntry, Page,
    PagePointer, RecordEntry, RecordSetFilter, RecordSetKey, RegionMap, ResourceRecordSet, Zone,
};

/// 原始 API 错误（内部使用）
#[derive(Debug, Clone)]
pub(crate) struct RawApiError {
    /// 错误码（各 Backend 格式不同）
    pub code: Option<String>,
    /// 原始错误消息
    pub message: String,
}

impl RawApiError {
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }
}

/// 错误上下文信息（内部使用）
/// 用于在映射错误时提供额外信息
#[derive(Debug, Clone, Default)]
pub(crate) struct ErrorContext {
    /// 记录名称（用于 `RecordExists` 等错误）
    pub record_name: Option<String>,
    /// 条目引用（用于 `RecordNotFound` 等错误）
    pub entry_ref: Option<String>,
    /// Zone（用于 `ZoneNotFound` 等错误）
    pub zone: Option<String>,
    /// 探测的特性（用于 `FeatureNotEnabled`）
    pub feature: Option<String>,
}

/// Backend 错误映射 Trait（内部使用）
/// 各 Backend 实现此 trait 以将原始 API 错误映射到统一错误类型
pub(crate) trait ProviderErrorMapper {
    /// 返回 Backend 标识符
    fn provider_name(&self) -> &'static str;

    /// 将原始 API 错误映射到统一错误类型
    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError;

    /// 快捷方法：解析错误
    fn parse_error(&self, detail: impl ToString) -> ProviderError {
        ProviderError::ParseError {
            provider: self.provider_name().to_string(),
            detail: detail.to_string(),
        }
    }

    /// 快捷方法：未知错误（fallback）
    fn unknown_error(&self, raw: RawApiError) -> ProviderError {
        ProviderError::Unknown {
            provider: self.provider_name().to_string(),
            raw_code: raw.code,
            raw_message: raw.message,
        }
    }
}

fn unsupported(provider: &str, operation: &str) -> ProviderError {
    ProviderError::Unsupported {
        provider: provider.to_string(),
        operation: operation.to_string(),
    }
}

/// A DNS backend, as seen by the reconciliation engine.
///
/// Every listing is page-at-a-time: the engine wraps these calls in a
/// [`PagedSequence`](crate::PagedSequence) and never holds more than one page.
/// A zone-level miss must surface as [`ProviderError::ZoneNotFound`]; a miss on
/// a specific name/type may surface as [`ProviderError::RecordNotFound`] or as
/// an empty page.
///
/// Optional operations default to [`ProviderError::Unsupported`], except
/// `create_pool` and `commit` which default to no-ops.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    /// 后端标识符
    fn id(&self) -> &'static str;

    /// 获取 Backend 元数据（类型级别）
    ///
    /// 此方法不需要实例，可以在创建 Backend 之前调用。
    fn metadata() -> BackendMetadata
    where
        Self: Sized;

    /// Capabilities declared by this instance.
    fn capabilities(&self) -> BackendCapabilities;

    /// Look up one zone by id (or name, for name-keyed backends).
    async fn get_zone(&self, zone: &str) -> Result<Zone>;

    /// One page of the account's zones.
    async fn list_zones(&self, cursor: Option<&PagePointer>) -> Result<Page<Zone>>;

    /// One page of record sets in `zone`, narrowed by `filter`.
    async fn list_record_sets(
        &self,
        zone: &str,
        filter: &RecordSetFilter,
        cursor: Option<&PagePointer>,
    ) -> Result<Page<ResourceRecordSet>>;

    /// One page of the stored entries of a single record set.
    async fn list_entries(
        &self,
        zone: &str,
        key: &RecordSetKey,
        cursor: Option<&PagePointer>,
    ) -> Result<Page<RecordEntry>> {
        let _ = (zone, key, cursor);
        Err(unsupported(self.id(), "list_entries"))
    }

    /// Replace a whole record set in one idempotent call.
    async fn replace_record_set(&self, zone: &str, rrset: &ResourceRecordSet) -> Result<()> {
        let _ = (zone, rrset);
        Err(unsupported(self.id(), "replace_record_set"))
    }

    /// Remove a whole record set in one call.
    async fn delete_record_set(&self, zone: &str, key: &RecordSetKey) -> Result<()> {
        let _ = (zone, key);
        Err(unsupported(self.id(), "delete_record_set"))
    }

    /// Store one entry, returning its reference.
    async fn create_entry(&self, zone: &str, entry: &NewEntry) -> Result<EntryRef> {
        let _ = (zone, entry);
        Err(unsupported(self.id(), "create_entry"))
    }

    /// Change one entry in place.
    async fn update_entry(&self, zone: &str, entry: &EntryRef, update: &EntryUpdate) -> Result<()> {
        let _ = (zone, entry, update);
        Err(unsupported(self.id(), "update_entry"))
    }

    /// Remove one entry.
    async fn delete_entry(&self, zone: &str, entry: &EntryRef) -> Result<()> {
        let _ = (zone, entry);
        Err(unsupported(self.id(), "delete_entry"))
    }

    /// Create the grouping pool that entries of `key` live in.
    async fn create_pool(&self, zone: &str, key: &RecordSetKey) -> Result<()> {
        let _ = (zone, key);
        Ok(())
    }

    /// Publish pending writes in `zone`.
    async fn commit(&self, zone: &str) -> Result<()> {
        let _ = zone;
        Ok(())
    }

    /// Ask the account whether an optional feature is enabled.
    ///
    /// May fail with [`ProviderError::FeatureNotEnabled`] instead of returning `false`.
    async fn probe_capability(&self, capability: Capability) -> Result<bool> {
        let _ = capability;
        Ok(false)
    }

    /// The backend's supported region catalog.
    async fn supported_regions(&self) -> Result<RegionMap> {
        Err(unsupported(self.id(), "supported_regions"))
    }
}
