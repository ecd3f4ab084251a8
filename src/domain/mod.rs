// ==========================================
// POSM 需求测算系统 - 领域模型层
// ==========================================
// 职责: 定义输入表、分配明细、报表视图与领域类型
// 红线: 不含文件读取逻辑,不含引擎逻辑
// ==========================================

pub mod allocation;
pub mod catalog;
pub mod quality;
pub mod report;
pub mod types;

// 重导出核心类型
pub use allocation::{AllocationLine, PricedLine, ResolvedObservation};
pub use catalog::{
    DisplayObservation, InputTables, Model, PosmLink, PriceEntry, QuantityTier, Store,
};
pub use quality::{DqLevel, DqReport, DqSummary, DqViolation, InputTable};
pub use report::{
    AddressSummaryRow, AllocationReport, GroupSummary, ModelPosmSummaryRow, PosmSummaryRow,
    ReportViews, RunDiagnostics,
};
pub use types::{CategoryGroup, InvalidPriority, Priority, UnknownAddressPolicy};
