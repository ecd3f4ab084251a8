// ==========================================
// POSM 需求测算系统 - 输入数据表
// ==========================================
// 职责: 定义引擎消费的四类输入表（加载器输出）
// 红线: 进入引擎的行不得携带未解析/错误值
// ==========================================

use crate::domain::types::{CategoryGroup, Priority};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ==========================================
// DisplayObservation - 门店陈列观测
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayObservation {
    pub store_id: String,   // 门店
    pub model_id: String,   // 机型
    pub display_count: u64, // 观测到的陈列台数
}

impl DisplayObservation {
    pub fn new(store_id: &str, model_id: &str, display_count: u64) -> Self {
        Self {
            store_id: store_id.to_string(),
            model_id: model_id.to_string(),
            display_count,
        }
    }
}

// ==========================================
// Store - 门店目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    pub store_id: String,                 // 主键（门店名）
    pub delivery_address: Option<String>, // 配送地址,可缺失
}

impl Store {
    pub fn new(store_id: &str, delivery_address: Option<&str>) -> Self {
        Self {
            store_id: store_id.to_string(),
            delivery_address: delivery_address.map(|a| a.to_string()),
        }
    }
}

// ==========================================
// Model - 机型目录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub model_id: String,
    pub priority: Priority,
    pub category_group: CategoryGroup,
}

impl Model {
    pub fn new(model_id: &str, priority: Priority, category_group: CategoryGroup) -> Self {
        Self {
            model_id: model_id.to_string(),
            priority,
            category_group,
        }
    }
}

// ==========================================
// PosmLink - 机型 → POSM 配置关系（posm 表）
// ==========================================
// base_ratio: 每台陈列所需的 POSM 数量
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosmLink {
    pub model_id: String,
    pub posm_id: String,
    pub base_ratio: f64,
}

impl PosmLink {
    pub fn new(model_id: &str, posm_id: &str, base_ratio: f64) -> Self {
        Self {
            model_id: model_id.to_string(),
            posm_id: posm_id.to_string(),
            base_ratio,
        }
    }
}

// ==========================================
// QuantityTier - 阶梯价数量区间
// ==========================================
// 标签格式: "<200" / "201-500" / "1001 - 2000" / ">5000"
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QuantityTier {
    pub min: u64,         // 含
    pub max: Option<u64>, // 含; None 表示无上限
}

impl QuantityTier {
    pub fn contains(&self, quantity: u64) -> bool {
        quantity >= self.min && self.max.map_or(true, |max| quantity <= max)
    }

    /// 解析区间标签
    pub fn parse(label: &str) -> Option<Self> {
        let compact: String = label.chars().filter(|c| !c.is_whitespace()).collect();
        if compact.is_empty() {
            return None;
        }

        if let Some(rest) = compact.strip_prefix("<=") {
            return parse_bound(rest).map(|max| Self { min: 0, max: Some(max) });
        }
        if let Some(rest) = compact.strip_prefix('<') {
            return parse_bound(rest).map(|max| Self { min: 0, max: Some(max) });
        }
        if let Some(rest) = compact.strip_prefix(">=") {
            return parse_bound(rest).map(|min| Self { min, max: None });
        }
        if let Some(rest) = compact.strip_prefix('>') {
            return parse_bound(rest)
                .and_then(|min| min.checked_add(1))
                .map(|min| Self { min, max: None });
        }

        let (low, high) = compact.split_once('-')?;
        let min = parse_bound(low)?;
        let max = parse_bound(high)?;
        if min > max {
            return None;
        }
        Some(Self {
            min,
            max: Some(max),
        })
    }
}

fn parse_bound(value: &str) -> Option<u64> {
    value.replace(',', "").parse::<u64>().ok()
}

impl fmt::Display for QuantityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max {
            Some(max) => write!(f, "{}-{}", self.min, max),
            None => write!(f, ">={}", self.min),
        }
    }
}

// ==========================================
// PriceEntry - POSM 单价（price 表）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    pub posm_id: String,
    pub tier: Option<QuantityTier>, // None = 统一价
    pub unit_price: f64,
}

impl PriceEntry {
    pub fn flat(posm_id: &str, unit_price: f64) -> Self {
        Self {
            posm_id: posm_id.to_string(),
            tier: None,
            unit_price,
        }
    }

    pub fn tiered(posm_id: &str, tier: QuantityTier, unit_price: f64) -> Self {
        Self {
            posm_id: posm_id.to_string(),
            tier: Some(tier),
            unit_price,
        }
    }
}

// ==========================================
// InputTables - 一次报表运行的全部输入
// ==========================================
// 每次运行独占一份,运行之间不共享
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputTables {
    pub observations: Vec<DisplayObservation>,
    pub stores: Vec<Store>,
    pub models: Vec<Model>,
    pub posm_links: Vec<PosmLink>,
    pub prices: Vec<PriceEntry>,
    /// 因优先级非法被剔除的机型（用于区分丢弃原因）
    pub rejected_model_ids: BTreeSet<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_tier_parse_ranges() {
        assert_eq!(
            QuantityTier::parse("<200"),
            Some(QuantityTier { min: 0, max: Some(200) })
        );
        assert_eq!(
            QuantityTier::parse("1001 - 2000"),
            Some(QuantityTier { min: 1001, max: Some(2000) })
        );
        assert_eq!(
            QuantityTier::parse(">5000"),
            Some(QuantityTier { min: 5001, max: None })
        );
        assert_eq!(QuantityTier::parse("abc"), None);
        assert_eq!(QuantityTier::parse("500-201"), None);
        assert_eq!(QuantityTier::parse(">18446744073709551615"), None);
    }

    #[test]
    fn test_quantity_tier_contains() {
        let tier = QuantityTier::parse("201-500").unwrap();
        assert!(tier.contains(201));
        assert!(tier.contains(500));
        assert!(!tier.contains(200));
        assert!(!tier.contains(501));

        let open = QuantityTier::parse(">5000").unwrap();
        assert!(open.contains(1_000_000));
        assert!(!open.contains(5000));
    }
}
