// ==========================================
// POSM 需求测算系统 - 引擎编排器
// ==========================================
// 流程: 前置校验 → 关联 → 需求计算 → 计价 → 汇总
// 红线: 前置校验失败时不执行任何阶段
// ==========================================

use crate::domain::catalog::InputTables;
use crate::domain::report::{ReportViews, RunDiagnostics};
use crate::engine::aggregator::Aggregator;
use crate::engine::error::EngineResult;
use crate::engine::join::JoinEngine;
use crate::engine::precondition::check_preconditions;
use crate::engine::pricing::PricingApplier;
use crate::engine::requirement::RequirementCalculator;
use crate::engine::rules::AllocationRules;
use std::collections::BTreeSet;
use tracing::{debug, info};

/// 一次运行的引擎输出
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub views: ReportViews,
    pub diagnostics: RunDiagnostics,
}

pub struct AllocationPipeline {
    rules: AllocationRules,
    join: JoinEngine,
    calculator: RequirementCalculator,
    aggregator: Aggregator,
}

impl AllocationPipeline {
    pub fn new(rules: AllocationRules) -> Self {
        Self {
            join: JoinEngine::new(),
            calculator: RequirementCalculator::new(rules.clone()),
            aggregator: Aggregator::new(&rules),
            rules,
        }
    }

    pub fn rules(&self) -> &AllocationRules {
        &self.rules
    }

    /// 执行完整测算流程
    ///
    /// # 返回
    /// - Ok(PipelineOutput): 五个视图 + 运行诊断
    /// - Err(EngineError): 前置校验失败（不产生部分结果）
    pub fn run(&self, tables: &InputTables) -> EngineResult<PipelineOutput> {
        info!(
            observations = tables.observations.len(),
            stores = tables.stores.len(),
            models = tables.models.len(),
            posm_links = tables.posm_links.len(),
            prices = tables.prices.len(),
            "开始执行测算流程"
        );

        // ==========================================
        // 步骤0: 前置校验
        // ==========================================
        check_preconditions(tables, &self.rules)?;

        // ==========================================
        // 步骤1: 关联
        // ==========================================
        debug!("步骤1: 关联陈列观测与目录");
        let joined = self.join.join_tables(tables);

        let stores_without_address = joined
            .resolved
            .iter()
            .filter(|r| r.delivery_address.is_none())
            .map(|r| r.store_id.as_str())
            .collect::<BTreeSet<_>>()
            .len();

        // ==========================================
        // 步骤2: 需求计算
        // ==========================================
        debug!("步骤2: 展开分配明细");
        let lines = self.calculator.expand(&joined.resolved, &tables.posm_links);
        let allocation_lines = lines.len();
        let zero_quantity_lines = lines.iter().filter(|l| l.allocated_quantity == 0).count();

        // ==========================================
        // 步骤3: 计价
        // ==========================================
        debug!("步骤3: 计价");
        let (priced, pricing) = PricingApplier::new(&tables.prices).apply(lines);

        // ==========================================
        // 步骤4: 汇总
        // ==========================================
        debug!("步骤4: 汇总视图");
        let views = self.aggregator.build_views(&priced);

        let diagnostics = RunDiagnostics {
            observations_in: joined.stats.observations_in,
            merged_duplicates: joined.stats.merged_duplicates,
            dropped_unknown_store: joined.stats.dropped_unknown_store,
            dropped_unknown_model: joined.stats.dropped_unknown_model,
            dropped_invalid_priority: joined.stats.dropped_invalid_priority,
            resolved_pairs: joined.resolved.len(),
            allocation_lines,
            zero_quantity_lines,
            missing_price_lines: pricing.missing_price_lines,
            missing_price_posm_ids: pricing.missing_price_posm_ids,
            stores_without_address,
        };

        info!(
            allocation_lines = diagnostics.allocation_lines,
            dropped = diagnostics.dropped_total(),
            missing_price_lines = diagnostics.missing_price_lines,
            total_allocated = views.total_allocated(),
            "测算流程完成"
        );

        Ok(PipelineOutput { views, diagnostics })
    }
}
