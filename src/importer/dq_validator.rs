// ==========================================
// POSM 需求测算系统 - 数据质量校验器实现
// ==========================================
// 职责: 中间记录 → 领域记录 + DQ 违规明细
// 规则:
// - 必填值未解析: 行丢弃（WARNING）
// - 主键重复: 保留首行（CONFLICT）
// - 优先级非法: 机型剔除并记录（ERROR）
// - 配置关系重复: 配比累加（WARNING）
// ==========================================

use crate::domain::catalog::{DisplayObservation, Model, PosmLink, PriceEntry, QuantityTier, Store};
use crate::domain::quality::{DqLevel, DqReport, DqSummary, DqViolation, InputTable};
use crate::domain::types::{CategoryGroup, Priority};
use crate::importer::field_mapper::{
    RawModelRecord, RawObservationRecord, RawPosmLinkRecord, RawPriceRecord, RawStoreRecord,
};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// 机型表校验结果
#[derive(Debug, Clone, Default)]
pub struct ModelValidation {
    pub models: Vec<Model>,
    pub rejected_model_ids: BTreeSet<String>,
}

pub struct DqValidator {
    care_categories: Vec<String>,
}

impl DqValidator {
    pub fn new(care_categories: Vec<String>) -> Self {
        Self { care_categories }
    }

    fn violation(
        table: InputTable,
        row_number: usize,
        key: Option<&String>,
        level: DqLevel,
        field: &str,
        message: impl Into<String>,
    ) -> DqViolation {
        DqViolation {
            table,
            row_number,
            key: key.cloned(),
            level,
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// 校验陈列观测
    pub fn validate_observations(
        &self,
        records: Vec<RawObservationRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> Vec<DisplayObservation> {
        let mut observations = Vec::with_capacity(records.len());

        for record in records {
            match (record.store_id, record.model_id, record.display_count) {
                (Some(store_id), Some(model_id), Some(display_count)) => {
                    observations.push(DisplayObservation {
                        store_id,
                        model_id,
                        display_count,
                    });
                }
                (store_id, model_id, _) => {
                    let field = if store_id.is_none() {
                        "store"
                    } else if model_id.is_none() {
                        "model"
                    } else {
                        "display"
                    };
                    violations.push(Self::violation(
                        InputTable::FactDisplay,
                        record.row_number,
                        store_id.as_ref(),
                        DqLevel::Warning,
                        field,
                        "必填值缺失或为错误值，行已丢弃",
                    ));
                }
            }
        }

        observations
    }

    /// 校验门店目录
    pub fn validate_stores(
        &self,
        records: Vec<RawStoreRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> Vec<Store> {
        let mut stores = Vec::with_capacity(records.len());
        let mut seen = HashSet::new();

        for record in records {
            let store_id = match record.store_id {
                Some(id) => id,
                None => {
                    violations.push(Self::violation(
                        InputTable::StoreList,
                        record.row_number,
                        None,
                        DqLevel::Warning,
                        "store",
                        "门店名缺失，行已丢弃",
                    ));
                    continue;
                }
            };

            if !seen.insert(store_id.clone()) {
                violations.push(Self::violation(
                    InputTable::StoreList,
                    record.row_number,
                    Some(&store_id),
                    DqLevel::Conflict,
                    "store",
                    "门店重复，保留首行",
                ));
                continue;
            }

            if record.delivery_address.is_none() {
                violations.push(Self::violation(
                    InputTable::StoreList,
                    record.row_number,
                    Some(&store_id),
                    DqLevel::Info,
                    "address",
                    "配送地址缺失",
                ));
            }

            stores.push(Store {
                store_id,
                delivery_address: record.delivery_address,
            });
        }

        stores
    }

    /// 校验机型目录
    pub fn validate_models(
        &self,
        records: Vec<RawModelRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> ModelValidation {
        let mut result = ModelValidation::default();
        let mut seen = HashSet::new();

        for record in records {
            let model_id = match record.model_id {
                Some(id) => id,
                None => {
                    violations.push(Self::violation(
                        InputTable::Model,
                        record.row_number,
                        None,
                        DqLevel::Warning,
                        "model",
                        "机型缺失，行已丢弃",
                    ));
                    continue;
                }
            };

            if seen.contains(&model_id) {
                violations.push(Self::violation(
                    InputTable::Model,
                    record.row_number,
                    Some(&model_id),
                    DqLevel::Conflict,
                    "model",
                    "机型重复，保留首行",
                ));
                continue;
            }
            seen.insert(model_id.clone());

            let priority = match record.priority.as_deref().map(str::parse::<Priority>) {
                Some(Ok(priority)) => priority,
                Some(Err(e)) => {
                    violations.push(Self::violation(
                        InputTable::Model,
                        record.row_number,
                        Some(&model_id),
                        DqLevel::Error,
                        "priority",
                        e.to_string(),
                    ));
                    result.rejected_model_ids.insert(model_id);
                    continue;
                }
                None => {
                    violations.push(Self::violation(
                        InputTable::Model,
                        record.row_number,
                        Some(&model_id),
                        DqLevel::Error,
                        "priority",
                        "优先级缺失或为错误值，机型已剔除",
                    ));
                    result.rejected_model_ids.insert(model_id);
                    continue;
                }
            };

            let category_group = self.resolve_group(&record.group_tag, &record.category);
            if record.group_tag.is_some()
                && record.group_tag.as_deref().and_then(CategoryGroup::from_tag).is_none()
            {
                violations.push(Self::violation(
                    InputTable::Model,
                    record.row_number,
                    Some(&model_id),
                    DqLevel::Info,
                    "group",
                    format!("分组标签无法识别，按品类归入 {}", category_group),
                ));
            }

            result.models.push(Model {
                model_id,
                priority,
                category_group,
            });
        }

        result
    }

    /// 分组: 显式 Care/SDA 标签优先,其次按品类名归组,均缺失时为 SDA
    fn resolve_group(&self, group_tag: &Option<String>, category: &Option<String>) -> CategoryGroup {
        if let Some(group) = group_tag.as_deref().and_then(CategoryGroup::from_tag) {
            return group;
        }
        match category {
            Some(c) => CategoryGroup::classify(c, &self.care_categories),
            None => CategoryGroup::Sda,
        }
    }

    /// 校验机型 → POSM 配置关系
    pub fn validate_posm_links(
        &self,
        records: Vec<RawPosmLinkRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> Vec<PosmLink> {
        let mut merged: BTreeMap<(String, String), f64> = BTreeMap::new();

        for record in records {
            let (model_id, posm_id, base_ratio) =
                match (record.model_id, record.posm_id, record.base_ratio) {
                    (Some(m), Some(p), Some(r)) => (m, p, r),
                    (model_id, _, _) => {
                        violations.push(Self::violation(
                            InputTable::Posm,
                            record.row_number,
                            model_id.as_ref(),
                            DqLevel::Warning,
                            "model,posm,ratio",
                            "必填值缺失或为错误值，行已丢弃",
                        ));
                        continue;
                    }
                };

            let key = (model_id, posm_id);
            if let Some(existing) = merged.get_mut(&key) {
                violations.push(Self::violation(
                    InputTable::Posm,
                    record.row_number,
                    Some(&key.0),
                    DqLevel::Warning,
                    "posm",
                    format!("机型-POSM 配置重复 ({})，配比累加", key.1),
                ));
                *existing += base_ratio;
            } else {
                merged.insert(key, base_ratio);
            }
        }

        merged
            .into_iter()
            .map(|((model_id, posm_id), base_ratio)| PosmLink {
                model_id,
                posm_id,
                base_ratio,
            })
            .collect()
    }

    /// 校验单价表
    pub fn validate_prices(
        &self,
        records: Vec<RawPriceRecord>,
        violations: &mut Vec<DqViolation>,
    ) -> Vec<PriceEntry> {
        let mut prices = Vec::with_capacity(records.len());
        let mut seen: HashMap<String, HashSet<Option<QuantityTier>>> = HashMap::new();

        for record in records {
            let (posm_id, unit_price) = match (record.posm_id, record.unit_price) {
                (Some(p), Some(u)) => (p, u),
                (posm_id, _) => {
                    violations.push(Self::violation(
                        InputTable::Price,
                        record.row_number,
                        posm_id.as_ref(),
                        DqLevel::Warning,
                        "posm,price",
                        "必填值缺失或为错误值，行已丢弃",
                    ));
                    continue;
                }
            };

            let tier = match record.tier_label.as_deref() {
                None => None,
                Some(label) => match QuantityTier::parse(label) {
                    Some(tier) => Some(tier),
                    None => {
                        violations.push(Self::violation(
                            InputTable::Price,
                            record.row_number,
                            Some(&posm_id),
                            DqLevel::Error,
                            "range",
                            format!("数量区间无法解析: {}", label),
                        ));
                        continue;
                    }
                },
            };

            if !seen.entry(posm_id.clone()).or_default().insert(tier) {
                violations.push(Self::violation(
                    InputTable::Price,
                    record.row_number,
                    Some(&posm_id),
                    DqLevel::Conflict,
                    "posm",
                    "单价重复，保留首行",
                ));
                continue;
            }

            prices.push(PriceEntry {
                posm_id,
                tier,
                unit_price,
            });
        }

        prices
    }

    /// 生成 DQ 报告
    pub fn generate_dq_report(
        &self,
        total_rows: usize,
        accepted: usize,
        violations: Vec<DqViolation>,
    ) -> DqReport {
        let count = |level: DqLevel| violations.iter().filter(|v| v.level == level).count();

        DqReport {
            summary: DqSummary {
                total_rows,
                accepted,
                blocked: count(DqLevel::Error),
                warning: count(DqLevel::Warning),
                conflict: count(DqLevel::Conflict),
            },
            violations,
        }
    }
}
