//! 共享测试工具和辅助函数

#![allow(dead_code)]

use std::sync::Arc;

use dns_reconciler_core::ReconciliationEngine;
use dns_reconciler_provider::{
    BackendCall, BackendCapabilities, InMemoryBackend, Rdata, RecordData, RegionMap,
    ResourceRecordSet, Zone,
};

pub const ZONE: &str = "example.com.";

/// 断言 `Option` 为 `Some`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_some {
    ($expr:expr $(,)?) => {{
        let opt = $expr;
        assert!(opt.is_some(), "expected Some(..), got None");
        let Some(val) = opt else {
            return;
        };
        val
    }};
}

/// 断言 `Result` 为 `Ok`，并解包返回内部值（失败则直接让测试失败）。
#[macro_export]
macro_rules! require_ok {
    ($expr:expr $(,)?) => {{
        let res = $expr;
        assert!(res.is_ok(), "expected Ok(..), got {res:?}");
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

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

/// Plain A record set with ttl 300.
pub fn a_set(name: &str, addresses: &[&str]) -> ResourceRecordSet {
    ResourceRecordSet::builder(name, "A")
        .ttl(300)
        .add_all(addresses.iter().map(|addr| a(addr)))
        .build()
        .expect("valid record set")
}

/// Geo-qualified A record set with ttl 300.
pub fn geo_set(qualifier: &str, addresses: &[&str], geo: RegionMap) -> ResourceRecordSet {
    ResourceRecordSet::builder("www.example.com.", "A")
        .qualifier(qualifier)
        .ttl(300)
        .add_all(addresses.iter().map(|addr| a(addr)))
        .geo(geo)
        .build()
        .expect("valid record set")
}

/// Backend holding [`ZONE`] (ttl 3600), with pages of two and a small region catalog.
pub fn backend(capabilities: BackendCapabilities) -> Arc<InMemoryBackend> {
    Arc::new(
        InMemoryBackend::builder()
            .capabilities(capabilities)
            .page_size(2)
            .regions(regions(&[
                ("Mexico", &["Mexico"]),
                ("South America", &["Brazil", "Ecuador"]),
                ("US", &["Alaska", "Arizona", "Hawaii"]),
            ]))
            .zone(Zone::new(ZONE, 3600, "hostmaster@example.com"))
            .build(),
    )
}

pub fn engine(backend: &Arc<InMemoryBackend>) -> ReconciliationEngine {
    ReconciliationEngine::new(backend.clone())
}

/// Number of recorded calls matching `predicate`.
pub async fn count(backend: &InMemoryBackend, predicate: impl Fn(&BackendCall) -> bool) -> usize {
    backend.calls().await.iter().filter(|c| predicate(c)).count()
}
