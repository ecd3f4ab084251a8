// ==========================================
// POSM 需求测算系统 - 需求计算器
// ==========================================
// 公式（逐行: 门店 × 机型 × POSM）:
//   raw       = display_count × base_ratio
//   buffered  = raw × buffer_multiplier   (优先级 1)
//             = raw                       (优先级 2)
//   allocated = ceil(buffered / batch) × batch
//   raw == 0 ⇒ allocated = 0; raw > 0 ⇒ allocated >= batch
// ==========================================

use crate::domain::allocation::{AllocationLine, ResolvedObservation};
use crate::domain::catalog::PosmLink;
use crate::domain::types::Priority;
use crate::engine::rules::AllocationRules;
use std::collections::HashMap;
use tracing::{info, instrument};

/// 批量倍数判定容差（单位: 批）
const BATCH_TOLERANCE: f64 = 1e-9;

/// 计算单行分配数量
///
/// 已落在批量整数倍上的缓冲值（如 50 × 1.3 = 65）不因浮点误差进位到下一批。
pub fn allocate_quantity(raw_quantity: f64, priority: Priority, rules: &AllocationRules) -> u64 {
    if raw_quantity <= 0.0 {
        return 0;
    }

    let buffered = if priority.is_buffered() {
        raw_quantity * rules.buffer_multiplier
    } else {
        raw_quantity
    };

    let units = buffered / rules.batch_size as f64;
    let nearest = units.round();
    // 正需求至少一批
    let batches = if nearest >= 1.0 && (units - nearest).abs() < BATCH_TOLERANCE {
        nearest
    } else {
        units.ceil()
    };

    (batches as u64).saturating_mul(rules.batch_size)
}

pub struct RequirementCalculator {
    rules: AllocationRules,
}

impl RequirementCalculator {
    pub fn new(rules: AllocationRules) -> Self {
        Self { rules }
    }

    /// 展开分配明细
    ///
    /// # 返回
    /// 每个 (门店, 机型, POSM) 一行,仅包含配比为正的配置关系;
    /// 顺序: 门店 → 机型 → POSM
    #[instrument(skip_all, fields(resolved = resolved.len(), links = links.len()))]
    pub fn expand(&self, resolved: &[ResolvedObservation], links: &[PosmLink]) -> Vec<AllocationLine> {
        let mut links_by_model: HashMap<&str, Vec<&PosmLink>> = HashMap::new();
        for link in links.iter().filter(|l| l.base_ratio > 0.0) {
            links_by_model
                .entry(link.model_id.as_str())
                .or_default()
                .push(link);
        }
        for model_links in links_by_model.values_mut() {
            model_links.sort_by(|a, b| a.posm_id.cmp(&b.posm_id));
        }

        let mut lines = Vec::new();
        for obs in resolved {
            let Some(model_links) = links_by_model.get(obs.model_id.as_str()) else {
                continue;
            };

            for link in model_links {
                let raw_quantity = obs.display_count as f64 * link.base_ratio;
                lines.push(AllocationLine {
                    store_id: obs.store_id.clone(),
                    model_id: obs.model_id.clone(),
                    posm_id: link.posm_id.clone(),
                    priority: obs.priority,
                    category_group: obs.category_group,
                    delivery_address: obs.delivery_address.clone(),
                    display_count: obs.display_count,
                    base_ratio: link.base_ratio,
                    raw_quantity,
                    allocated_quantity: allocate_quantity(raw_quantity, obs.priority, &self.rules),
                });
            }
        }

        info!(
            allocation_lines = lines.len(),
            zero_quantity_lines = lines.iter().filter(|l| l.allocated_quantity == 0).count(),
            "需求计算完成"
        );

        lines
    }
}
