//! 共享测试工具和辅助函数

#![allow(dead_code)]

use dns_reconciler_provider::{
    BackendCapabilities, InMemoryBackend, Rdata, RecordData, ResourceRecordSet, Zone,
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
    ($expr:expr, $($msg:tt)+) => {{
        let opt = $expr;
        assert!(opt.is_some(), "{}", format_args!($($msg)+));
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
    ($expr:expr, $($msg:tt)+) => {{
        let res = $expr;
        assert!(
            res.is_ok(),
            "{}: {res:?}",
            format_args!($($msg)+)
        );
        let Ok(val) = res else {
            return;
        };
        val
    }};
}

/// A record value.
pub fn a(address: &str) -> Rdata {
    RecordData::A {
        address: address.to_string(),
    }
    .into()
}

/// Plain A record set with the given addresses.
pub fn a_set(name: &str, addresses: &[&str]) -> ResourceRecordSet {
    ResourceRecordSet::builder(name, "A")
        .ttl(300)
        .add_all(addresses.iter().map(|addr| a(addr)))
        .build()
        .expect("valid record set")
}

/// Backend holding [`ZONE`], with small pages so listings span several calls.
pub fn backend(capabilities: BackendCapabilities) -> InMemoryBackend {
    InMemoryBackend::builder()
        .capabilities(capabilities)
        .page_size(2)
        .zone(Zone::new(ZONE, 3600, "hostmaster@example.com"))
        .build()
}
