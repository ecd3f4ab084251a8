// ==========================================
// POSM 需求测算系统 - 关联引擎
// ==========================================
// 职责: 陈列观测 × 门店目录 × 机型目录
// 规则:
// - 门店或机型查不到: 行丢弃并计数（不报错）
// - 被剔除的机型（优先级非法）单独计数
// - 重复 (门店, 机型) 陈列台数累加
// ==========================================

use crate::domain::allocation::ResolvedObservation;
use crate::domain::catalog::{DisplayObservation, InputTables, Model, Store};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument};

/// 关联统计
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinStats {
    pub observations_in: usize,
    pub merged_duplicates: usize,
    pub dropped_unknown_store: usize,
    pub dropped_unknown_model: usize,
    pub dropped_invalid_priority: usize,
}

#[derive(Debug, Clone, Default)]
pub struct JoinOutcome {
    /// 按 (门店, 机型) 排序
    pub resolved: Vec<ResolvedObservation>,
    pub stats: JoinStats,
}

pub struct JoinEngine;

impl JoinEngine {
    pub fn new() -> Self {
        Self
    }

    #[instrument(skip_all, fields(observations = tables.observations.len()))]
    pub fn join_tables(&self, tables: &InputTables) -> JoinOutcome {
        self.join(
            &tables.observations,
            &tables.stores,
            &tables.models,
            &tables.rejected_model_ids,
        )
    }

    /// 关联陈列观测与门店、机型
    ///
    /// # 参数
    /// - observations: 陈列观测
    /// - stores: 门店目录
    /// - models: 机型目录（仅含合法优先级）
    /// - rejected_model_ids: 因优先级非法被剔除的机型
    pub fn join(
        &self,
        observations: &[DisplayObservation],
        stores: &[Store],
        models: &[Model],
        rejected_model_ids: &BTreeSet<String>,
    ) -> JoinOutcome {
        let store_index: HashMap<&str, &Store> =
            stores.iter().map(|s| (s.store_id.as_str(), s)).collect();
        let model_index: HashMap<&str, &Model> =
            models.iter().map(|m| (m.model_id.as_str(), m)).collect();

        let mut stats = JoinStats {
            observations_in: observations.len(),
            ..JoinStats::default()
        };
        let mut merged: BTreeMap<(&str, &str), ResolvedObservation> = BTreeMap::new();

        for obs in observations {
            let store = match store_index.get(obs.store_id.as_str()) {
                Some(store) => *store,
                None => {
                    debug!(store_id = %obs.store_id, model_id = %obs.model_id, "门店未知,行丢弃");
                    stats.dropped_unknown_store += 1;
                    continue;
                }
            };

            let model = match model_index.get(obs.model_id.as_str()) {
                Some(model) => *model,
                None if rejected_model_ids.contains(&obs.model_id) => {
                    debug!(model_id = %obs.model_id, "机型优先级非法,行丢弃");
                    stats.dropped_invalid_priority += 1;
                    continue;
                }
                None => {
                    debug!(store_id = %obs.store_id, model_id = %obs.model_id, "机型未知,行丢弃");
                    stats.dropped_unknown_model += 1;
                    continue;
                }
            };

            let key = (obs.store_id.as_str(), obs.model_id.as_str());
            match merged.get_mut(&key) {
                Some(existing) => {
                    existing.display_count =
                        existing.display_count.saturating_add(obs.display_count);
                    stats.merged_duplicates += 1;
                }
                None => {
                    merged.insert(
                        key,
                        ResolvedObservation {
                            store_id: obs.store_id.clone(),
                            model_id: obs.model_id.clone(),
                            display_count: obs.display_count,
                            priority: model.priority,
                            category_group: model.category_group,
                            delivery_address: store.delivery_address.clone(),
                        },
                    );
                }
            }
        }

        let resolved: Vec<ResolvedObservation> = merged.into_values().collect();

        info!(
            observations_in = stats.observations_in,
            resolved_pairs = resolved.len(),
            merged_duplicates = stats.merged_duplicates,
            dropped_unknown_store = stats.dropped_unknown_store,
            dropped_unknown_model = stats.dropped_unknown_model,
            dropped_invalid_priority = stats.dropped_invalid_priority,
            "关联完成"
        );

        JoinOutcome { resolved, stats }
    }
}

impl Default for JoinEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{CategoryGroup, Priority};

    fn stores() -> Vec<Store> {
        vec![Store::new("S1", Some("12 Main St")), Store::new("S2", None)]
    }

    fn models() -> Vec<Model> {
        vec![
            Model::new("WM-1", Priority::Critical, CategoryGroup::Care),
            Model::new("TV-1", Priority::Standard, CategoryGroup::Sda),
        ]
    }

    #[test]
    fn test_join_resolves_attributes() {
        let observations = vec![DisplayObservation::new("S2", "TV-1", 3)];

        let outcome = JoinEngine::new().join(&observations, &stores(), &models(), &BTreeSet::new());

        assert_eq!(outcome.resolved.len(), 1);
        let row = &outcome.resolved[0];
        assert_eq!(row.priority, Priority::Standard);
        assert_eq!(row.category_group, CategoryGroup::Sda);
        assert_eq!(row.delivery_address, None);
    }

    #[test]
    fn test_join_sums_duplicate_pairs() {
        let observations = vec![
            DisplayObservation::new("S1", "WM-1", 2),
            DisplayObservation::new("S1", "WM-1", 5),
        ];

        let outcome = JoinEngine::new().join(&observations, &stores(), &models(), &BTreeSet::new());

        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.resolved[0].display_count, 7);
        assert_eq!(outcome.stats.merged_duplicates, 1);
    }

    #[test]
    fn test_join_duplicate_sum_saturates() {
        let observations = vec![
            DisplayObservation::new("S1", "WM-1", u64::MAX),
            DisplayObservation::new("S1", "WM-1", 5),
        ];

        let outcome = JoinEngine::new().join(&observations, &stores(), &models(), &BTreeSet::new());

        assert_eq!(outcome.resolved[0].display_count, u64::MAX);
    }

    #[test]
    fn test_join_drops_and_counts_unknowns() {
        let observations = vec![
            DisplayObservation::new("S9", "WM-1", 2),
            DisplayObservation::new("S1", "XX-1", 2),
            DisplayObservation::new("S1", "BAD-1", 2),
            DisplayObservation::new("S1", "WM-1", 1),
        ];
        let rejected: BTreeSet<String> = ["BAD-1".to_string()].into_iter().collect();

        let outcome = JoinEngine::new().join(&observations, &stores(), &models(), &rejected);

        assert_eq!(outcome.resolved.len(), 1);
        assert_eq!(outcome.stats.observations_in, 4);
        assert_eq!(outcome.stats.dropped_unknown_store, 1);
        assert_eq!(outcome.stats.dropped_unknown_model, 1);
        assert_eq!(outcome.stats.dropped_invalid_priority, 1);
    }

    #[test]
    fn test_join_output_sorted_by_key() {
        let observations = vec![
            DisplayObservation::new("S2", "WM-1", 1),
            DisplayObservation::new("S1", "WM-1", 1),
            DisplayObservation::new("S1", "TV-1", 1),
        ];

        let outcome = JoinEngine::new().join(&observations, &stores(), &models(), &BTreeSet::new());
        let keys: Vec<(&str, &str)> = outcome
            .resolved
            .iter()
            .map(|r| (r.store_id.as_str(), r.model_id.as_str()))
            .collect();

        assert_eq!(keys, vec![("S1", "TV-1"), ("S1", "WM-1"), ("S2", "WM-1")]);
    }
}
