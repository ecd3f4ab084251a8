// ==========================================
// POSM 需求测算系统 - API 层
// ==========================================
// 职责: 对外报表接口（单次 / 批量）
// ==========================================

pub mod error;
pub mod report_api;

pub use error::{ApiError, ApiResult};
pub use report_api::{BatchItemResult, ReportApi};
