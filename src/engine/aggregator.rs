// ==========================================
// POSM 需求测算系统 - 汇总器
// ==========================================
// 视图（均为明细集合的纯函数,按键排序）:
// 1. POSM 汇总          键: posm_id
// 2. 机型 × POSM 汇总   键: (model_id, posm_id)
// 3. 配送地址汇总       键: delivery_address（无地址 → 哨兵桶 / 丢弃）
// 4. Care 组汇总        键: posm_id
// 5. SDA 组汇总         键: posm_id
// ==========================================

use crate::domain::allocation::PricedLine;
use crate::domain::report::{
    AddressSummaryRow, GroupSummary, ModelPosmSummaryRow, PosmSummaryRow, ReportViews,
};
use crate::domain::types::CategoryGroup;
use crate::engine::rules::AllocationRules;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, instrument};

pub struct Aggregator {
    unknown_address_label: Option<String>, // None = 无地址门店不进入地址汇总
}

impl Aggregator {
    pub fn new(rules: &AllocationRules) -> Self {
        Self {
            unknown_address_label: rules.unknown_address_label().map(str::to_string),
        }
    }

    #[instrument(skip_all, fields(lines = lines.len()))]
    pub fn build_views(&self, lines: &[PricedLine]) -> ReportViews {
        let care: Vec<&PricedLine> = lines
            .iter()
            .filter(|l| l.line.category_group == CategoryGroup::Care)
            .collect();
        let sda: Vec<&PricedLine> = lines
            .iter()
            .filter(|l| l.line.category_group == CategoryGroup::Sda)
            .collect();

        let views = ReportViews {
            posm_summary: summarize_by_posm(lines.iter()),
            model_posm_summary: summarize_by_model_posm(lines),
            address_summary: self.summarize_by_address(lines),
            care_summary: GroupSummary {
                category_group: CategoryGroup::Care,
                rows: summarize_by_posm(care.into_iter()),
            },
            sda_summary: GroupSummary {
                category_group: CategoryGroup::Sda,
                rows: summarize_by_posm(sda.into_iter()),
            },
        };

        info!(
            posm_rows = views.posm_summary.len(),
            model_posm_rows = views.model_posm_summary.len(),
            address_rows = views.address_summary.len(),
            care_rows = views.care_summary.rows.len(),
            sda_rows = views.sda_summary.rows.len(),
            total_allocated = views.total_allocated(),
            total_cost = views.total_cost(),
            "汇总完成"
        );

        views
    }

    fn summarize_by_address(&self, lines: &[PricedLine]) -> Vec<AddressSummaryRow> {
        struct Acc<'a> {
            stores: BTreeSet<&'a str>,
            allocated: u64,
            cost: f64,
            missing: usize,
        }

        let mut groups: BTreeMap<&str, Acc> = BTreeMap::new();
        for priced in lines {
            let address = match (&priced.line.delivery_address, &self.unknown_address_label) {
                (Some(address), _) => address.as_str(),
                (None, Some(label)) => label.as_str(),
                (None, None) => continue,
            };

            let acc = groups.entry(address).or_insert_with(|| Acc {
                stores: BTreeSet::new(),
                allocated: 0,
                cost: 0.0,
                missing: 0,
            });
            acc.stores.insert(priced.line.store_id.as_str());
            acc.allocated += priced.allocated_quantity();
            acc.cost += priced.line_cost;
            if priced.price_missing {
                acc.missing += 1;
            }
        }

        groups
            .into_iter()
            .map(|(address, acc)| AddressSummaryRow {
                delivery_address: address.to_string(),
                store_count: acc.stores.len(),
                allocated_quantity: acc.allocated,
                total_cost: acc.cost,
                missing_price_lines: acc.missing,
            })
            .collect()
    }
}

fn summarize_by_posm<'a>(lines: impl Iterator<Item = &'a PricedLine>) -> Vec<PosmSummaryRow> {
    let mut groups: BTreeMap<&str, PosmSummaryRow> = BTreeMap::new();

    for priced in lines {
        let row = groups
            .entry(priced.posm_id())
            .or_insert_with(|| PosmSummaryRow {
                posm_id: priced.posm_id().to_string(),
                raw_quantity: 0.0,
                allocated_quantity: 0,
                unit_price: priced.unit_price,
                raw_cost: 0.0,
                total_cost: 0.0,
                line_count: 0,
                missing_price_lines: 0,
            });
        row.raw_quantity += priced.line.raw_quantity;
        row.allocated_quantity += priced.allocated_quantity();
        row.raw_cost += priced.raw_cost();
        row.total_cost += priced.line_cost;
        row.line_count += 1;
        if priced.price_missing {
            row.missing_price_lines += 1;
        }
    }

    groups.into_values().collect()
}

fn summarize_by_model_posm(lines: &[PricedLine]) -> Vec<ModelPosmSummaryRow> {
    let mut groups: BTreeMap<(&str, &str), ModelPosmSummaryRow> = BTreeMap::new();

    for priced in lines {
        let line = &priced.line;
        let row = groups
            .entry((line.model_id.as_str(), line.posm_id.as_str()))
            .or_insert_with(|| ModelPosmSummaryRow {
                model_id: line.model_id.clone(),
                posm_id: line.posm_id.clone(),
                priority: line.priority,
                category_group: line.category_group,
                display_count: 0,
                raw_quantity: 0.0,
                allocated_quantity: 0,
                total_cost: 0.0,
                missing_price_lines: 0,
            });
        row.display_count += line.display_count;
        row.raw_quantity += line.raw_quantity;
        row.allocated_quantity += line.allocated_quantity;
        row.total_cost += priced.line_cost;
        if priced.price_missing {
            row.missing_price_lines += 1;
        }
    }

    groups.into_values().collect()
}
