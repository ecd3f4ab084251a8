// ==========================================
// POSM 需求测算系统 - 分配明细实体
// ==========================================
// 生命周期: 单次运行内创建 → 定价 → 汇总 → 丢弃
// 红线: 明细创建后不可变,定价只做包装
// ==========================================

use crate::domain::types::{CategoryGroup, Priority};
use serde::{Deserialize, Serialize};

// ==========================================
// ResolvedObservation - 关联后的陈列观测
// ==========================================
// 同一 (store_id, model_id) 的观测已合并求和
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedObservation {
    pub store_id: String,
    pub model_id: String,
    pub display_count: u64,
    pub priority: Priority,
    pub category_group: CategoryGroup,
    pub delivery_address: Option<String>,
}

// ==========================================
// AllocationLine - (门店, 机型, POSM) 分配明细
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationLine {
    pub store_id: String,
    pub model_id: String,
    pub posm_id: String,
    pub priority: Priority,
    pub category_group: CategoryGroup,
    pub delivery_address: Option<String>,
    pub display_count: u64,
    pub base_ratio: f64,
    pub raw_quantity: f64,        // 缓冲/取整前
    pub allocated_quantity: u64,  // 缓冲 + 取整后
}

// ==========================================
// PricedLine - 定价后的分配明细
// ==========================================
// 缺价明细保留、成本为 0、打标记,不丢弃
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line: AllocationLine,
    pub unit_price: Option<f64>,
    pub line_cost: f64,
    pub price_missing: bool,
}

impl PricedLine {
    pub fn allocated_quantity(&self) -> u64 {
        self.line.allocated_quantity
    }

    pub fn posm_id(&self) -> &str {
        &self.line.posm_id
    }

    /// 未缓冲/未取整数量按同一单价计算的成本; 缺价为 0
    pub fn raw_cost(&self) -> f64 {
        self.unit_price
            .map_or(0.0, |price| price * self.line.raw_quantity)
    }
}
