// ==========================================
// POSM 需求测算系统 - 报表视图
// ==========================================
// 五个汇总视图 + 运行诊断 + 报表信封
// ==========================================

use crate::domain::quality::DqReport;
use crate::domain::types::{CategoryGroup, Priority};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// 视图 1 / 4 / 5: 按 POSM 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosmSummaryRow {
    pub posm_id: String,
    pub raw_quantity: f64,
    pub allocated_quantity: u64,
    pub unit_price: Option<f64>, // 缺价时为 None
    pub raw_cost: f64,           // raw_quantity × 单价, 与 total_cost 之差即缓冲采购成本
    pub total_cost: f64,
    pub line_count: usize,
    pub missing_price_lines: usize,
}

// ==========================================
// 视图 2: 按 机型 × POSM 汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPosmSummaryRow {
    pub model_id: String,
    pub posm_id: String,
    pub priority: Priority,
    pub category_group: CategoryGroup,
    pub display_count: u64,
    pub raw_quantity: f64,
    pub allocated_quantity: u64,
    pub total_cost: f64,
    pub missing_price_lines: usize,
}

// ==========================================
// 视图 3: 按配送地址汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressSummaryRow {
    pub delivery_address: String, // 无地址门店归入哨兵标签
    pub store_count: usize,
    pub allocated_quantity: u64,
    pub total_cost: f64,
    pub missing_price_lines: usize,
}

// ==========================================
// 品类分组汇总（Care / SDA）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub category_group: CategoryGroup,
    pub rows: Vec<PosmSummaryRow>,
}

impl GroupSummary {
    pub fn total_allocated(&self) -> u64 {
        self.rows.iter().map(|r| r.allocated_quantity).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.total_cost).sum()
    }

    pub fn total_raw_cost(&self) -> f64 {
        self.rows.iter().map(|r| r.raw_cost).sum()
    }
}

// ==========================================
// ReportViews - 五个视图
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportViews {
    pub posm_summary: Vec<PosmSummaryRow>,
    pub model_posm_summary: Vec<ModelPosmSummaryRow>,
    pub address_summary: Vec<AddressSummaryRow>,
    pub care_summary: GroupSummary,
    pub sda_summary: GroupSummary,
}

impl ReportViews {
    pub fn total_allocated(&self) -> u64 {
        self.posm_summary.iter().map(|r| r.allocated_quantity).sum()
    }

    pub fn total_cost(&self) -> f64 {
        self.posm_summary.iter().map(|r| r.total_cost).sum()
    }

    pub fn total_raw_cost(&self) -> f64 {
        self.posm_summary.iter().map(|r| r.raw_cost).sum()
    }
}

// ==========================================
// RunDiagnostics - 运行诊断
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunDiagnostics {
    pub observations_in: usize,
    pub merged_duplicates: usize,
    pub dropped_unknown_store: usize,
    pub dropped_unknown_model: usize,
    pub dropped_invalid_priority: usize,
    pub resolved_pairs: usize,
    pub allocation_lines: usize,
    pub zero_quantity_lines: usize,
    pub missing_price_lines: usize,
    pub missing_price_posm_ids: Vec<String>,
    pub stores_without_address: usize,
}

impl RunDiagnostics {
    pub fn dropped_total(&self) -> usize {
        self.dropped_unknown_store + self.dropped_unknown_model + self.dropped_invalid_priority
    }
}

// ==========================================
// AllocationReport - 报表信封
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationReport {
    pub run_id: String,
    pub generated_at: DateTime<Utc>,
    pub views: ReportViews,
    pub diagnostics: RunDiagnostics,
    pub dq_report: DqReport,
    pub config_snapshot: String, // 生成时的配置快照（JSON）
}
