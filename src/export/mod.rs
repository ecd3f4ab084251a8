// ==========================================
// POSM 需求测算系统 - 导出层
// ==========================================
// 职责: 报表 → 工作簿（每视图一个工作表）+ CSV + report.json
// ==========================================

pub mod error;
pub mod report_writer;

pub use error::{ExportError, ExportResult};
pub use report_writer::ReportWriter;
