// ==========================================
// POSM 需求测算系统 - 数据质量报告
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// InputTable - 输入表标识
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputTable {
    FactDisplay,
    StoreList,
    Model,
    Posm,
    Price,
}

impl fmt::Display for InputTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputTable::FactDisplay => write!(f, "fact_display"),
            InputTable::StoreList => write!(f, "dim_storelist"),
            InputTable::Model => write!(f, "dim_model"),
            InputTable::Posm => write!(f, "dim_posm.posm"),
            InputTable::Price => write!(f, "dim_posm.price"),
        }
    }
}

// ==========================================
// DqLevel - 数据质量级别
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DqLevel {
    Error,    // 错误（该行被剔除）
    Warning,  // 警告（行被丢弃或修正后保留）
    Info,     // 提示（仅记录）
    Conflict, // 主键冲突（保留首行）
}

impl fmt::Display for DqLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DqLevel::Error => write!(f, "ERROR"),
            DqLevel::Warning => write!(f, "WARNING"),
            DqLevel::Info => write!(f, "INFO"),
            DqLevel::Conflict => write!(f, "CONFLICT"),
        }
    }
}

// ==========================================
// DqViolation - 数据质量违规明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DqViolation {
    pub table: InputTable,
    pub row_number: usize,       // 数据行号（表头之后从 1 开始）
    pub key: Option<String>,     // 行主键（如果可解析）
    pub level: DqLevel,
    pub field: String,
    pub message: String,
}

// ==========================================
// DqSummary - 数据质量汇总
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqSummary {
    pub total_rows: usize, // 各表数据行合计
    pub accepted: usize,   // 进入引擎的行
    pub blocked: usize,    // ERROR
    pub warning: usize,    // WARNING
    pub conflict: usize,   // CONFLICT
}

// ==========================================
// DqReport - 数据质量报告
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DqReport {
    pub summary: DqSummary,
    pub violations: Vec<DqViolation>,
}

impl DqReport {
    pub fn count_level(&self, level: DqLevel) -> usize {
        self.violations.iter().filter(|v| v.level == level).count()
    }

    pub fn has_errors(&self) -> bool {
        self.count_level(DqLevel::Error) > 0
    }
}
