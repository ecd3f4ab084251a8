// ==========================================
// POSM 需求测算系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / NULL 标准化 / 错误值识别 / 数值解析
// ==========================================

use crate::domain::quality::InputTable;
use crate::importer::error::{ImportError, ImportResult};

/// 电子表格错误值与常见空值字面量（大写比较）
const UNRESOLVED_LITERALS: &[&str] = &[
    "#N/A",
    "#N/A N/A",
    "#NA",
    "#REF!",
    "#VALUE!",
    "#DIV/0!",
    "#NAME?",
    "#NULL!",
    "#NUM!",
    "#GETTING_DATA",
    "NAN",
    "NULL",
    "NONE",
];

pub struct DataCleaner;

impl DataCleaner {
    /// 清洗文本字段（TRIM）
    pub fn clean_text(&self, value: &str) -> String {
        value.trim().to_string()
    }

    /// 是否为未解析值（空白、错误值、空值字面量）
    pub fn is_unresolved(&self, value: &str) -> bool {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return true;
        }
        let upper = trimmed.to_uppercase();
        UNRESOLVED_LITERALS.contains(&upper.as_str())
    }

    /// 标准化单元格: 未解析值 → None
    pub fn normalize_cell(&self, value: Option<&str>) -> Option<String> {
        value.and_then(|v| {
            if self.is_unresolved(v) {
                None
            } else {
                Some(self.clean_text(v))
            }
        })
    }

    /// 解析陈列台数（非负整数; 允许 "10.0" 这类 Excel 数值导出）
    pub fn parse_count(
        &self,
        value: &str,
        table: InputTable,
        row: usize,
        field: &str,
    ) -> ImportResult<u64> {
        let number = self.parse_number(value, table, row, field)?;

        if number.fract() != 0.0 {
            return Err(ImportError::TypeConversionError {
                table,
                row,
                field: field.to_string(),
                message: format!("陈列台数必须为整数: {}", value),
            });
        }
        if number > u64::MAX as f64 {
            return Err(ImportError::TypeConversionError {
                table,
                row,
                field: field.to_string(),
                message: format!("数值过大: {}", value),
            });
        }

        Ok(number as u64)
    }

    /// 解析非负小数（单价 / 配比）
    pub fn parse_decimal(
        &self,
        value: &str,
        table: InputTable,
        row: usize,
        field: &str,
    ) -> ImportResult<f64> {
        self.parse_number(value, table, row, field)
    }

    fn parse_number(
        &self,
        value: &str,
        table: InputTable,
        row: usize,
        field: &str,
    ) -> ImportResult<f64> {
        let normalized = value.trim().replace(',', "");
        let number = normalized
            .parse::<f64>()
            .map_err(|_| ImportError::TypeConversionError {
                table,
                row,
                field: field.to_string(),
                message: format!("无法解析为数值: {}", value),
            })?;

        if !number.is_finite() {
            return Err(ImportError::TypeConversionError {
                table,
                row,
                field: field.to_string(),
                message: format!("数值非有限值: {}", value),
            });
        }
        if number < 0.0 {
            return Err(ImportError::ValueRangeError {
                table,
                row,
                field: field.to_string(),
                value: number,
            });
        }

        Ok(number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_basic() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  hello  "), "hello");
        assert_eq!(cleaner.clean_text("\tWM-100 "), "WM-100");
    }

    #[test]
    fn test_normalize_cell() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_cell(Some("  ")), None);
        assert_eq!(cleaner.normalize_cell(Some("#N/A")), None);
        assert_eq!(cleaner.normalize_cell(Some("#ref!")), None);
        assert_eq!(cleaner.normalize_cell(Some("nan")), None);
        assert_eq!(cleaner.normalize_cell(None), None);
        assert_eq!(
            cleaner.normalize_cell(Some("  12 Main St ")),
            Some("12 Main St".to_string())
        );
    }

    #[test]
    fn test_parse_count() {
        let cleaner = DataCleaner;
        let t = InputTable::FactDisplay;
        assert_eq!(cleaner.parse_count("10", t, 1, "display").unwrap(), 10);
        assert_eq!(cleaner.parse_count("10.0", t, 1, "display").unwrap(), 10);
        assert_eq!(cleaner.parse_count("1,200", t, 1, "display").unwrap(), 1200);
        assert!(matches!(
            cleaner.parse_count("abc", t, 1, "display"),
            Err(ImportError::TypeConversionError { .. })
        ));
        assert!(matches!(
            cleaner.parse_count("2.5", t, 1, "display"),
            Err(ImportError::TypeConversionError { .. })
        ));
        assert!(matches!(
            cleaner.parse_count("-1", t, 1, "display"),
            Err(ImportError::ValueRangeError { .. })
        ));
    }

    #[test]
    fn test_parse_decimal() {
        let cleaner = DataCleaner;
        let t = InputTable::Price;
        assert_eq!(cleaner.parse_decimal("12.5", t, 1, "price").unwrap(), 12.5);
        assert!(cleaner.parse_decimal("inf", t, 1, "price").is_err());
        assert!(cleaner.parse_decimal("-0.5", t, 1, "price").is_err());
    }
}
