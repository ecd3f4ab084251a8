// ==========================================
// POSM 需求测算系统 - 报表 API
// ==========================================
// 职责: 加载 → 前置校验 → 测算 → 报表信封
// 批量: 多个独立请求并发执行,互不共享状态,单个失败不影响其他请求
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::AllocationConfigReader;
use crate::domain::catalog::InputTables;
use crate::domain::quality::DqReport;
use crate::domain::report::AllocationReport;
use crate::domain::types::UnknownAddressPolicy;
use crate::engine::{AllocationPipeline, AllocationRules};
use crate::importer::{InputLoader, InputLoaderImpl, InputPaths};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// 报表中记录的生效配置
#[derive(Debug, Serialize)]
struct EffectiveConfig<'a> {
    buffer_multiplier: f64,
    batch_size: u64,
    unknown_address_policy: &'a UnknownAddressPolicy,
    report_locale: String,
    care_categories: Vec<String>,
}

/// 批量运行中单个请求的结果
#[derive(Debug)]
pub struct BatchItemResult {
    pub paths: InputPaths,
    pub result: ApiResult<AllocationReport>,
}

pub struct ReportApi<C>
where
    C: AllocationConfigReader,
{
    config: Arc<C>,
    loader: InputLoaderImpl<Arc<C>>,
}

impl<C> ReportApi<C>
where
    C: AllocationConfigReader,
{
    pub fn new(config: Arc<C>) -> Self {
        Self {
            loader: InputLoaderImpl::new(config.clone()),
            config,
        }
    }

    /// 从输入文件生成报表
    ///
    /// # 参数
    /// - paths: 输入文件
    ///
    /// # 返回
    /// - Ok(AllocationReport): 五个视图 + 诊断 + DQ 报告
    /// - Err(ApiError): 输入结构错误 / 配置错误（整次运行中止）
    #[instrument(skip(self, paths), fields(run_id))]
    pub async fn generate_report(&self, paths: &InputPaths) -> ApiResult<AllocationReport> {
        let loaded = self.loader.load_inputs(paths).await.map_err(|e| {
            error!(error = %e, "输入加载失败");
            ApiError::from(e)
        })?;

        self.run_with_dq(loaded.tables, loaded.dq_report).await
    }

    /// 对内存中的输入表生成报表
    pub async fn run_tables(&self, tables: InputTables) -> ApiResult<AllocationReport> {
        self.run_with_dq(tables, DqReport::default()).await
    }

    async fn run_with_dq(&self, tables: InputTables, dq_report: DqReport) -> ApiResult<AllocationReport> {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());

        let rules = AllocationRules::load(self.config.as_ref()).await?;
        let config_snapshot = self.config_snapshot(&rules).await?;

        let output = AllocationPipeline::new(rules).run(&tables).map_err(|e| {
            error!(run_id = %run_id, error = %e, "测算失败");
            ApiError::from(e)
        })?;

        info!(
            run_id = %run_id,
            total_allocated = output.views.total_allocated(),
            total_cost = output.views.total_cost(),
            "报表生成完成"
        );

        Ok(AllocationReport {
            run_id,
            generated_at: Utc::now(),
            views: output.views,
            diagnostics: output.diagnostics,
            dq_report,
            config_snapshot,
        })
    }

    async fn config_snapshot(&self, rules: &AllocationRules) -> ApiResult<String> {
        let effective = EffectiveConfig {
            buffer_multiplier: rules.buffer_multiplier,
            batch_size: rules.batch_size,
            unknown_address_policy: &rules.unknown_address,
            report_locale: self.config.get_report_locale().await?,
            care_categories: self.config.get_care_categories().await?,
        };
        serde_json::to_string(&effective).map_err(|e| ApiError::InternalError(e.to_string()))
    }

    /// 批量生成报表（并发,互相独立）
    ///
    /// # 返回
    /// 与输入顺序一致的逐项结果
    pub async fn batch_generate(&self, requests: Vec<InputPaths>) -> Vec<BatchItemResult> {
        info!(requests = requests.len(), "开始批量生成报表");

        let futures = requests.iter().map(|paths| self.generate_report(paths));
        let results = join_all(futures).await;

        let items: Vec<BatchItemResult> = requests
            .into_iter()
            .zip(results)
            .map(|(paths, result)| BatchItemResult { paths, result })
            .collect();

        let failed = items.iter().filter(|i| i.result.is_err()).count();
        info!(
            succeeded = items.len() - failed,
            failed = failed,
            "批量生成完成"
        );

        items
    }
}
