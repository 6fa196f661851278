//! 测试辅助模块
//!
//! 提供 fixture 构造函数和预配置的内存后端。

use std::sync::Arc;

use dns_reconciler_provider::{
    BackendCapabilities, InMemoryBackend, Rdata, RecordData, RegionMap, ResourceRecordSet, Zone,
};

pub const ZONE: &str = "example.com.";

pub fn regions(pairs: &[(&str, &[&str])]) -> RegionMap {
    pairs
        .iter()
        .map(|(region, territories)| {
            (
                (*region).to_string(),
                territories.iter().map(|t| (*t).to_string()).collect(),
            )
        })
        .collect()
}

pub fn a(address: &str) -> Rdata {
    RecordData::A {
        address: address.to_string(),
    }
    .into()
}

/// Plain A set with ttl 300.
pub fn a_set(name: &str, addresses: &[&str]) -> ResourceRecordSet {
    ResourceRecordSet::builder(name, "A")
        .ttl(300)
        .add_all(addresses.iter().map(|addr| a(addr)))
        .build()
        .unwrap()
}

/// Memory backend with [`ZONE`] (ttl 3600) and two-item pages.
pub fn backend(capabilities: BackendCapabilities) -> Arc<InMemoryBackend> {
    Arc::new(
        InMemoryBackend::builder()
            .capabilities(capabilities)
            .page_size(2)
            .zone(Zone::new(ZONE, 3600, "hostmaster@example.com"))
            .build(),
    )
}
