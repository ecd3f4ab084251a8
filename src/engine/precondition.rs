// ==========================================
// POSM 需求测算系统 - 引擎前置校验
// ==========================================
// 职责: 在任何计算阶段之前拒绝结构性错误
// 红线: 校验失败整次运行中止,不产生部分报表
// ==========================================

use crate::domain::catalog::{InputTables, QuantityTier};
use crate::domain::quality::InputTable;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::rules::AllocationRules;
use std::collections::{BTreeMap, HashSet};

/// 校验输入表与规则
///
/// # 规则
/// - 门店 / 机型主键唯一
/// - (机型, POSM) 配置唯一,配比为非负有限值
/// - (POSM, 区间) 单价唯一,单价为非负有限值,同一 POSM 的区间互不重叠
/// - 分配规则合法
pub fn check_preconditions(tables: &InputTables, rules: &AllocationRules) -> EngineResult<()> {
    rules.validate()?;

    let mut store_ids = HashSet::new();
    for store in &tables.stores {
        if !store_ids.insert(store.store_id.as_str()) {
            return Err(EngineError::malformed(
                InputTable::StoreList,
                format!("门店主键重复: {}", store.store_id),
            ));
        }
    }

    let mut model_ids = HashSet::new();
    for model in &tables.models {
        if !model_ids.insert(model.model_id.as_str()) {
            return Err(EngineError::malformed(
                InputTable::Model,
                format!("机型主键重复: {}", model.model_id),
            ));
        }
    }

    let mut links = HashSet::new();
    for link in &tables.posm_links {
        if !links.insert((link.model_id.as_str(), link.posm_id.as_str())) {
            return Err(EngineError::malformed(
                InputTable::Posm,
                format!("机型-POSM 配置重复: {} / {}", link.model_id, link.posm_id),
            ));
        }
        if !link.base_ratio.is_finite() || link.base_ratio < 0.0 {
            return Err(EngineError::malformed(
                InputTable::Posm,
                format!(
                    "配比不合法 ({} / {}): {}",
                    link.model_id, link.posm_id, link.base_ratio
                ),
            ));
        }
    }

    let mut tiers_by_posm: BTreeMap<&str, Vec<QuantityTier>> = BTreeMap::new();
    let mut flat_prices = HashSet::new();
    for price in &tables.prices {
        if !price.unit_price.is_finite() || price.unit_price < 0.0 {
            return Err(EngineError::malformed(
                InputTable::Price,
                format!("单价不合法 ({}): {}", price.posm_id, price.unit_price),
            ));
        }
        match price.tier {
            None => {
                if !flat_prices.insert(price.posm_id.as_str()) {
                    return Err(EngineError::malformed(
                        InputTable::Price,
                        format!("单价重复: {}", price.posm_id),
                    ));
                }
            }
            Some(tier) => tiers_by_posm
                .entry(price.posm_id.as_str())
                .or_default()
                .push(tier),
        }
    }

    for (posm_id, mut tiers) in tiers_by_posm {
        tiers.sort();
        for pair in tiers.windows(2) {
            let (lower, upper) = (pair[0], pair[1]);
            let overlaps = match lower.max {
                Some(max) => upper.min <= max,
                None => true,
            };
            if overlaps {
                return Err(EngineError::malformed(
                    InputTable::Price,
                    format!("数量区间重叠 ({}): {} / {}", posm_id, lower, upper),
                ));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::catalog::{Model, PosmLink, PriceEntry, Store};
    use crate::domain::types::{CategoryGroup, Priority};

    fn tables() -> InputTables {
        InputTables {
            stores: vec![Store::new("S1", Some("A")), Store::new("S2", None)],
            models: vec![Model::new("M1", Priority::Critical, CategoryGroup::Care)],
            posm_links: vec![PosmLink::new("M1", "P1", 1.0)],
            prices: vec![
                PriceEntry::tiered("P1", QuantityTier { min: 0, max: Some(199) }, 10.0),
                PriceEntry::tiered("P1", QuantityTier { min: 200, max: None }, 8.0),
                PriceEntry::flat("P1", 9.0),
            ],
            ..InputTables::default()
        }
    }

    #[test]
    fn test_valid_tables_pass() {
        assert!(check_preconditions(&tables(), &AllocationRules::default()).is_ok());
    }

    #[test]
    fn test_duplicate_store_rejected() {
        let mut t = tables();
        t.stores.push(Store::new("S1", Some("B")));
        let err = check_preconditions(&t, &AllocationRules::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedInput { table: InputTable::StoreList, .. }
        ));
    }

    #[test]
    fn test_negative_ratio_rejected() {
        let mut t = tables();
        t.posm_links[0].base_ratio = -1.0;
        assert!(check_preconditions(&t, &AllocationRules::default()).is_err());
    }

    #[test]
    fn test_non_finite_price_rejected() {
        let mut t = tables();
        t.prices[2].unit_price = f64::NAN;
        assert!(check_preconditions(&t, &AllocationRules::default()).is_err());
    }

    #[test]
    fn test_overlapping_tiers_rejected() {
        let mut t = tables();
        t.prices
            .push(PriceEntry::tiered("P1", QuantityTier { min: 150, max: Some(300) }, 7.0));
        let err = check_preconditions(&t, &AllocationRules::default()).unwrap_err();
        assert!(matches!(
            err,
            EngineError::MalformedInput { table: InputTable::Price, .. }
        ));
    }

    #[test]
    fn test_invalid_rule_rejected() {
        let rules = AllocationRules {
            batch_size: 0,
            ..AllocationRules::default()
        };
        assert!(matches!(
            check_preconditions(&tables(), &rules),
            Err(EngineError::InvalidRule { .. })
        ));
    }
}
