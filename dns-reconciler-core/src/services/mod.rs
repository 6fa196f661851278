//! 业务逻辑服务层

mod plan;
mod reconciliation_service;
mod session_service;

pub use plan::{PlannedOp, ReconcilePlan};
pub use reconciliation_service::{
    ReconcileOptions, ReconcileReport, ReconciliationEngine, ReconciliationEngineBuilder,
};
pub use session_service::TokenCache;
