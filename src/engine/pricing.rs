// ==========================================
// POSM 需求测算系统 - 计价器
// ==========================================
// 规则:
// - 单价按 posm_id 查找; 有数量区间时按该 POSM 全部分配量选档
// - 无匹配区间时回退统一价
// - 缺价: line_cost = 0,行保留并标记,不丢弃
// ==========================================

use crate::domain::allocation::{AllocationLine, PricedLine};
use crate::domain::catalog::{PriceEntry, QuantityTier};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{info, instrument, warn};

// ==========================================
// PriceBook - 单价表索引
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    flat: HashMap<String, f64>,
    tiered: HashMap<String, Vec<(QuantityTier, f64)>>,
}

impl PriceBook {
    pub fn new(prices: &[PriceEntry]) -> Self {
        let mut book = Self::default();
        for entry in prices {
            match entry.tier {
                None => {
                    book.flat
                        .entry(entry.posm_id.clone())
                        .or_insert(entry.unit_price);
                }
                Some(tier) => book
                    .tiered
                    .entry(entry.posm_id.clone())
                    .or_default()
                    .push((tier, entry.unit_price)),
            }
        }
        for tiers in book.tiered.values_mut() {
            tiers.sort_by(|a, b| a.0.cmp(&b.0));
        }
        book
    }

    /// 解析单价
    ///
    /// # 参数
    /// - posm_id: POSM 编号
    /// - total_quantity: 该 POSM 本次运行的总分配量（用于选档）
    pub fn resolve(&self, posm_id: &str, total_quantity: u64) -> Option<f64> {
        self.tiered
            .get(posm_id)
            .and_then(|tiers| {
                tiers
                    .iter()
                    .find(|(tier, _)| tier.contains(total_quantity))
                    .map(|(_, price)| *price)
            })
            .or_else(|| self.flat.get(posm_id).copied())
    }
}

/// 计价统计
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PricingStats {
    pub missing_price_lines: usize,
    pub missing_price_posm_ids: Vec<String>,
}

pub struct PricingApplier {
    book: PriceBook,
}

impl PricingApplier {
    pub fn new(prices: &[PriceEntry]) -> Self {
        Self {
            book: PriceBook::new(prices),
        }
    }

    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn apply(&self, lines: Vec<AllocationLine>) -> (Vec<PricedLine>, PricingStats) {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for line in &lines {
            *totals.entry(line.posm_id.as_str()).or_default() += line.allocated_quantity;
        }
        let unit_prices: HashMap<String, Option<f64>> = totals
            .into_iter()
            .map(|(posm_id, total)| (posm_id.to_string(), self.book.resolve(posm_id, total)))
            .collect();

        let mut stats = PricingStats::default();
        let mut missing_ids = BTreeSet::new();

        let priced: Vec<PricedLine> = lines
            .into_iter()
            .map(|line| {
                let unit_price = unit_prices.get(&line.posm_id).copied().flatten();
                let price_missing = unit_price.is_none();
                if price_missing {
                    stats.missing_price_lines += 1;
                    missing_ids.insert(line.posm_id.clone());
                }
                let line_cost = unit_price.map_or(0.0, |p| line.allocated_quantity as f64 * p);
                PricedLine {
                    line,
                    unit_price,
                    line_cost,
                    price_missing,
                }
            })
            .collect();

        stats.missing_price_posm_ids = missing_ids.into_iter().collect();

        if !stats.missing_price_posm_ids.is_empty() {
            warn!(
                missing_price_lines = stats.missing_price_lines,
                posm_ids = ?stats.missing_price_posm_ids,
                "存在缺价 POSM,成本按 0 计"
            );
        }
        info!(priced_lines = priced.len(), "计价完成");

        (priced, stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CategoryGroup, Priority};

    fn line(store: &str, posm: &str, allocated: u64) -> AllocationLine {
        AllocationLine {
            store_id: store.to_string(),
            model_id: "WM-1".to_string(),
            posm_id: posm.to_string(),
            priority: Priority::Standard,
            category_group: CategoryGroup::Care,
            delivery_address: None,
            display_count: allocated,
            base_ratio: 1.0,
            raw_quantity: allocated as f64,
            allocated_quantity: allocated,
        }
    }

    #[test]
    fn test_flat_price_applied() {
        let applier = PricingApplier::new(&[PriceEntry::flat("P1", 2.5)]);
        let (priced, stats) = applier.apply(vec![line("S1", "P1", 10)]);

        assert_eq!(priced[0].unit_price, Some(2.5));
        assert_eq!(priced[0].line_cost, 25.0);
        assert!(!priced[0].price_missing);
        assert_eq!(stats.missing_price_lines, 0);
    }

    #[test]
    fn test_missing_price_kept_with_zero_cost() {
        let applier = PricingApplier::new(&[PriceEntry::flat("P1", 2.5)]);
        let (priced, stats) = applier.apply(vec![line("S1", "PX", 15), line("S2", "PX", 5)]);

        assert_eq!(priced.len(), 2);
        assert!(priced.iter().all(|p| p.price_missing && p.line_cost == 0.0));
        assert_eq!(priced[0].allocated_quantity(), 15);
        assert_eq!(stats.missing_price_lines, 2);
        assert_eq!(stats.missing_price_posm_ids, vec!["PX".to_string()]);
    }

    #[test]
    fn test_tier_chosen_by_posm_total() {
        let prices = vec![
            PriceEntry::tiered("P1", QuantityTier { min: 0, max: Some(199) }, 10.0),
            PriceEntry::tiered("P1", QuantityTier { min: 200, max: None }, 8.0),
        ];
        let applier = PricingApplier::new(&prices);

        // 单行均 < 200,合计 250 落入第二档
        let (priced, _) = applier.apply(vec![line("S1", "P1", 150), line("S2", "P1", 100)]);

        assert!(priced.iter().all(|p| p.unit_price == Some(8.0)));
        assert_eq!(priced[0].line_cost, 1200.0);
    }

    #[test]
    fn test_flat_fallback_when_no_tier_matches() {
        let prices = vec![
            PriceEntry::tiered("P1", QuantityTier { min: 500, max: None }, 3.0),
            PriceEntry::flat("P1", 4.0),
        ];
        let book = PriceBook::new(&prices);

        assert_eq!(book.resolve("P1", 100), Some(4.0));
        assert_eq!(book.resolve("P1", 600), Some(3.0));
        assert_eq!(book.resolve("P2", 600), None);
    }
}
