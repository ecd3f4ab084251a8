// ==========================================
// POSM 需求测算系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段（别名、大小写不敏感）+ 类型转换
// 红线: 必填列缺失在逐行处理之前报错
// ==========================================

use crate::domain::quality::InputTable;
use crate::importer::data_cleaner::DataCleaner;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::{RawRow, RawTable};
use std::collections::HashMap;

// ==========================================
// 列定义
// ==========================================
pub struct ColumnSpec {
    pub field: &'static str,
    pub aliases: &'static [&'static str],
    pub required: bool,
}

pub mod columns {
    use super::ColumnSpec;

    pub const FACT_DISPLAY: &[ColumnSpec] = &[
        ColumnSpec { field: "store", aliases: &["store", "shop", "store name", "store_id"], required: true },
        ColumnSpec { field: "model", aliases: &["model", "model_id"], required: true },
        ColumnSpec { field: "display", aliases: &["display", "quantity", "qty"], required: true },
    ];

    pub const STORE_LIST: &[ColumnSpec] = &[
        ColumnSpec { field: "store", aliases: &["store name", "shop", "store", "store_id"], required: true },
        ColumnSpec { field: "address", aliases: &["address", "delivery_address", "delivery address"], required: true },
    ];

    // group / category 至少其一（见 resolve_model_columns）
    pub const MODEL: &[ColumnSpec] = &[
        ColumnSpec { field: "model", aliases: &["model", "model_id"], required: true },
        ColumnSpec { field: "priority", aliases: &["priority"], required: true },
        ColumnSpec { field: "group", aliases: &["group", "category_group", "category group"], required: false },
        ColumnSpec { field: "category", aliases: &["category", "product category", "product_category"], required: false },
    ];

    pub const POSM: &[ColumnSpec] = &[
        ColumnSpec { field: "model", aliases: &["model", "model_id"], required: true },
        ColumnSpec { field: "posm", aliases: &["posm", "posm_id"], required: true },
        ColumnSpec { field: "ratio", aliases: &["ratio", "base_ratio", "qty_per_display"], required: false },
    ];

    pub const PRICE: &[ColumnSpec] = &[
        ColumnSpec { field: "posm", aliases: &["posm", "posm_id"], required: true },
        ColumnSpec { field: "price", aliases: &["price", "unit_price", "unit price"], required: true },
        ColumnSpec { field: "range", aliases: &["range", "tier", "quantity_range"], required: false },
    ];
}

// ==========================================
// ResolvedColumns - 标准字段 → 实际表头
// ==========================================
#[derive(Debug, Clone)]
pub struct ResolvedColumns {
    table: InputTable,
    headers: HashMap<&'static str, String>,
}

impl ResolvedColumns {
    pub fn table(&self) -> InputTable {
        self.table
    }

    pub fn has(&self, field: &str) -> bool {
        self.headers.contains_key(field)
    }

    fn header(&self, field: &str) -> Option<&str> {
        self.headers.get(field).map(|h| h.as_str())
    }
}

// ==========================================
// 中间记录（映射后、校验前）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct RawObservationRecord {
    pub row_number: usize,
    pub store_id: Option<String>,
    pub model_id: Option<String>,
    pub display_count: Option<u64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawStoreRecord {
    pub row_number: usize,
    pub store_id: Option<String>,
    pub delivery_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawModelRecord {
    pub row_number: usize,
    pub model_id: Option<String>,
    pub priority: Option<String>,
    pub group_tag: Option<String>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPosmLinkRecord {
    pub row_number: usize,
    pub model_id: Option<String>,
    pub posm_id: Option<String>,
    /// 无配比列时为 Some(1.0); 配比单元格未解析时为 None
    pub base_ratio: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawPriceRecord {
    pub row_number: usize,
    pub posm_id: Option<String>,
    pub unit_price: Option<f64>,
    pub tier_label: Option<String>,
}

// ==========================================
// FieldMapper
// ==========================================
pub struct FieldMapper {
    cleaner: DataCleaner,
}

impl Default for FieldMapper {
    fn default() -> Self {
        Self::new()
    }
}

impl FieldMapper {
    pub fn new() -> Self {
        Self {
            cleaner: DataCleaner,
        }
    }

    /// 解析表头
    ///
    /// # 返回
    /// - Err(MissingColumn): 必填列的所有别名均不存在
    pub fn resolve_columns(
        &self,
        table: InputTable,
        raw: &RawTable,
        specs: &[ColumnSpec],
    ) -> ImportResult<ResolvedColumns> {
        let mut headers = HashMap::new();

        for spec in specs {
            let found = spec.aliases.iter().find_map(|alias| {
                raw.headers
                    .iter()
                    .find(|h| h.trim().eq_ignore_ascii_case(alias))
                    .cloned()
            });

            match found {
                Some(header) => {
                    headers.insert(spec.field, header);
                }
                None if spec.required => {
                    return Err(ImportError::MissingColumn {
                        table,
                        expected: spec.aliases.join(" / "),
                    });
                }
                None => {}
            }
        }

        Ok(ResolvedColumns { table, headers })
    }

    /// 机型表表头: 在通用解析之外要求 group / category 至少其一
    pub fn resolve_model_columns(&self, raw: &RawTable) -> ImportResult<ResolvedColumns> {
        let resolved = self.resolve_columns(InputTable::Model, raw, columns::MODEL)?;
        if !resolved.has("group") && !resolved.has("category") {
            return Err(ImportError::MissingColumn {
                table: InputTable::Model,
                expected: "group / category_group / category".to_string(),
            });
        }
        Ok(resolved)
    }

    fn get_string(&self, row: &RawRow, cols: &ResolvedColumns, field: &str) -> Option<String> {
        cols.header(field)
            .and_then(|h| self.cleaner.normalize_cell(row.get(h)))
    }

    pub fn map_observation(
        &self,
        row: &RawRow,
        cols: &ResolvedColumns,
    ) -> ImportResult<RawObservationRecord> {
        let display_count = match self.get_string(row, cols, "display") {
            None => None,
            Some(v) => Some(
                self.cleaner
                    .parse_count(&v, cols.table(), row.row_number, "display")?,
            ),
        };

        Ok(RawObservationRecord {
            row_number: row.row_number,
            store_id: self.get_string(row, cols, "store"),
            model_id: self.get_string(row, cols, "model"),
            display_count,
        })
    }

    pub fn map_store(&self, row: &RawRow, cols: &ResolvedColumns) -> ImportResult<RawStoreRecord> {
        Ok(RawStoreRecord {
            row_number: row.row_number,
            store_id: self.get_string(row, cols, "store"),
            delivery_address: self.get_string(row, cols, "address"),
        })
    }

    pub fn map_model(&self, row: &RawRow, cols: &ResolvedColumns) -> ImportResult<RawModelRecord> {
        Ok(RawModelRecord {
            row_number: row.row_number,
            model_id: self.get_string(row, cols, "model"),
            priority: self.get_string(row, cols, "priority"),
            group_tag: self.get_string(row, cols, "group"),
            category: self.get_string(row, cols, "category"),
        })
    }

    pub fn map_posm_link(
        &self,
        row: &RawRow,
        cols: &ResolvedColumns,
    ) -> ImportResult<RawPosmLinkRecord> {
        let base_ratio = if cols.has("ratio") {
            match self.get_string(row, cols, "ratio") {
                None => None,
                Some(v) => Some(
                    self.cleaner
                        .parse_decimal(&v, cols.table(), row.row_number, "ratio")?,
                ),
            }
        } else {
            Some(1.0)
        };

        Ok(RawPosmLinkRecord {
            row_number: row.row_number,
            model_id: self.get_string(row, cols, "model"),
            posm_id: self.get_string(row, cols, "posm"),
            base_ratio,
        })
    }

    pub fn map_price(&self, row: &RawRow, cols: &ResolvedColumns) -> ImportResult<RawPriceRecord> {
        let unit_price = match self.get_string(row, cols, "price") {
            None => None,
            Some(v) => Some(
                self.cleaner
                    .parse_decimal(&v, cols.table(), row.row_number, "price")?,
            ),
        };

        Ok(RawPriceRecord {
            row_number: row.row_number,
            posm_id: self.get_string(row, cols, "posm"),
            unit_price,
            tier_label: self.get_string(row, cols, "range"),
        })
    }
}
