// ==========================================
// POSM 需求测算系统 - 输入加载器实现
// ==========================================
// 职责: 整合加载流程,从文件到清洗后的输入表
// 流程: 解析 → 列名解析 → 映射 → 清洗/校验 → DQ 报告
// ==========================================

use crate::config::AllocationConfigReader;
use crate::domain::catalog::InputTables;
use crate::domain::quality::{DqReport, DqViolation, InputTable};
use crate::importer::dq_validator::DqValidator;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::{columns, FieldMapper, ResolvedColumns};
use crate::importer::file_parser::{RawRow, RawTable, SheetSelector, UniversalFileParser};
use crate::importer::input_loader_trait::{FileParser, InputLoader};
use crate::importer::input_paths::InputPaths;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

pub const POSM_SHEET: &str = "posm";
pub const PRICE_SHEET: &str = "price";

/// 加载结果: 输入表 + DQ 报告
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoadedInputs {
    pub tables: InputTables,
    pub dq_report: DqReport,
}

// ==========================================
// InputLoaderImpl
// ==========================================
pub struct InputLoaderImpl<C>
where
    C: AllocationConfigReader,
{
    config: C,
    file_parser: Box<dyn FileParser>,
    field_mapper: FieldMapper,
}

impl<C> InputLoaderImpl<C>
where
    C: AllocationConfigReader,
{
    /// 使用通用文件解析器创建加载器
    pub fn new(config: C) -> Self {
        Self::with_parser(config, Box::new(UniversalFileParser))
    }

    pub fn with_parser(config: C, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            config,
            file_parser,
            field_mapper: FieldMapper::new(),
        }
    }

    fn parse(&self, table: InputTable, path: &Path, sheet: SheetSelector) -> ImportResult<RawTable> {
        let raw = self.file_parser.parse_to_raw_table(path, &sheet)?;
        debug!(table = %table, rows = raw.rows.len(), file = %path.display(), "文件解析完成");
        Ok(raw)
    }

    /// posm 工作簿必须包含 posm 工作表; CSV 只有一张表
    fn posm_sheet(paths: &InputPaths) -> SheetSelector {
        if UniversalFileParser::is_excel(&paths.posm) {
            SheetSelector::Named(POSM_SHEET.to_string())
        } else {
            SheetSelector::First
        }
    }

    /// 价格表来源: 单独文件,或 posm 工作簿中的 price 工作表
    fn price_source<'a>(&self, paths: &'a InputPaths) -> ImportResult<(&'a Path, SheetSelector)> {
        match &paths.price {
            Some(price) => Ok((price.as_path(), SheetSelector::PreferNamed(PRICE_SHEET.to_string()))),
            None if UniversalFileParser::is_excel(&paths.posm) => {
                Ok((paths.posm.as_path(), SheetSelector::Named(PRICE_SHEET.to_string())))
            }
            None => Err(ImportError::MissingSheet {
                file: paths.posm.display().to_string(),
                sheet: PRICE_SHEET.to_string(),
            }),
        }
    }

    fn map_rows<T>(
        raw: &RawTable,
        cols: &ResolvedColumns,
        map: impl Fn(&RawRow, &ResolvedColumns) -> ImportResult<T>,
    ) -> ImportResult<Vec<T>> {
        raw.rows.iter().map(|row| map(row, cols)).collect()
    }
}

#[async_trait]
impl<C> InputLoader for InputLoaderImpl<C>
where
    C: AllocationConfigReader,
{
    #[instrument(skip(self, paths), fields(fact_display = %paths.fact_display.display()))]
    async fn load_inputs(&self, paths: &InputPaths) -> ImportResult<LoadedInputs> {
        let care_categories = self.config.get_care_categories().await?;
        info!(care_categories = ?care_categories, "开始加载输入表");

        // === 步骤 1: 解析文件 ===
        let (price_path, price_sheet) = self.price_source(paths)?;
        let fact_raw = self.parse(InputTable::FactDisplay, &paths.fact_display, SheetSelector::First)?;
        let store_raw = self.parse(InputTable::StoreList, &paths.store_list, SheetSelector::First)?;
        let model_raw = self.parse(InputTable::Model, &paths.model, SheetSelector::First)?;
        let posm_raw = self.parse(InputTable::Posm, &paths.posm, Self::posm_sheet(paths))?;
        let price_raw = self.parse(InputTable::Price, price_path, price_sheet)?;

        // === 步骤 2: 列名解析（任何逐行处理之前） ===
        let mapper = &self.field_mapper;
        let fact_cols = mapper.resolve_columns(InputTable::FactDisplay, &fact_raw, columns::FACT_DISPLAY)?;
        let store_cols = mapper.resolve_columns(InputTable::StoreList, &store_raw, columns::STORE_LIST)?;
        let model_cols = mapper.resolve_model_columns(&model_raw)?;
        let posm_cols = mapper.resolve_columns(InputTable::Posm, &posm_raw, columns::POSM)?;
        let price_cols = mapper.resolve_columns(InputTable::Price, &price_raw, columns::PRICE)?;

        // === 步骤 3: 字段映射（非数值即中止） ===
        let fact_records = Self::map_rows(&fact_raw, &fact_cols, |r, c| mapper.map_observation(r, c))?;
        let store_records = Self::map_rows(&store_raw, &store_cols, |r, c| mapper.map_store(r, c))?;
        let model_records = Self::map_rows(&model_raw, &model_cols, |r, c| mapper.map_model(r, c))?;
        let posm_records = Self::map_rows(&posm_raw, &posm_cols, |r, c| mapper.map_posm_link(r, c))?;
        let price_records = Self::map_rows(&price_raw, &price_cols, |r, c| mapper.map_price(r, c))?;

        let total_rows = fact_raw.rows.len()
            + store_raw.rows.len()
            + model_raw.rows.len()
            + posm_raw.rows.len()
            + price_raw.rows.len();

        // === 步骤 4: 清洗与校验 ===
        let validator = DqValidator::new(care_categories);
        let mut violations: Vec<DqViolation> = Vec::new();

        let observations = validator.validate_observations(fact_records, &mut violations);
        let stores = validator.validate_stores(store_records, &mut violations);
        let model_validation = validator.validate_models(model_records, &mut violations);
        let posm_links = validator.validate_posm_links(posm_records, &mut violations);
        let prices = validator.validate_prices(price_records, &mut violations);

        let tables = InputTables {
            observations,
            stores,
            models: model_validation.models,
            posm_links,
            prices,
            rejected_model_ids: model_validation.rejected_model_ids,
        };

        let accepted = tables.observations.len()
            + tables.stores.len()
            + tables.models.len()
            + tables.posm_links.len()
            + tables.prices.len();

        // === 步骤 5: DQ 报告 ===
        let dq_report = validator.generate_dq_report(total_rows, accepted, violations);
        if dq_report.has_errors() {
            warn!(blocked = dq_report.summary.blocked, "存在被剔除的输入行");
        }

        info!(
            total_rows = total_rows,
            accepted = accepted,
            observations = tables.observations.len(),
            stores = tables.stores.len(),
            models = tables.models.len(),
            rejected_models = tables.rejected_model_ids.len(),
            posm_links = tables.posm_links.len(),
            prices = tables.prices.len(),
            "输入表加载完成"
        );

        Ok(LoadedInputs { tables, dq_report })
    }
}
