// ==========================================
// POSM 需求测算系统 - 文件解析器实现
// ==========================================
// 支持: Excel (.xlsx/.xls, 可选工作表) / CSV (.csv)
// 输出: 表头 + 原始行（值均为去首尾空白的字符串）
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use crate::importer::input_loader_trait::FileParser;
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

// ==========================================
// RawTable - 原始表
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

#[derive(Debug, Clone, Default)]
pub struct RawRow {
    pub row_number: usize, // 数据行号（表头之后从 1 开始）
    pub values: HashMap<String, String>,
}

impl RawRow {
    pub fn get(&self, header: &str) -> Option<&str> {
        self.values.get(header).map(|v| v.as_str())
    }
}

// ==========================================
// SheetSelector - 工作表选择
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SheetSelector {
    First,                 // 第一个工作表
    Named(String),         // 必须存在的工作表（大小写不敏感）
    PreferNamed(String),   // 存在则取该表,否则取第一个
}

fn push_row(records: &mut Vec<RawRow>, headers: &[String], row_number: usize, cells: Vec<String>) {
    let mut values = HashMap::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            values.insert(header.clone(), value.trim().to_string());
        }
    }

    // 跳过完全空白的行
    if values.values().all(|v| v.is_empty()) {
        return;
    }

    records.push(RawRow { row_number, values });
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path, _sheet: &SheetSelector) -> ImportResult<RawTable> {
        let path = file_path;

        // 检查文件存在
        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        // 检查扩展名
        if let Some(ext) = path.extension() {
            if !ext.eq_ignore_ascii_case("csv") {
                return Err(ImportError::UnsupportedFormat(
                    ext.to_string_lossy().to_string(),
                ));
            }
        }

        let file = File::open(path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头（去除 UTF-8 BOM）
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let cells = record.iter().map(|v| v.to_string()).collect();
            push_row(&mut rows, &headers, row_idx + 1, cells);
        }

        Ok(RawTable { headers, rows })
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

/// 单元格 → 文本; 错误单元格保留其字面量（如 #N/A）,由清洗器识别为未解析值
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Error(e) => e.to_string(),
        other => other.to_string(),
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_table(&self, file_path: &Path, sheet: &SheetSelector) -> ImportResult<RawTable> {
        let path = file_path;

        if !path.exists() {
            return Err(ImportError::FileNotFound(path.display().to_string()));
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext != "xlsx" && ext != "xls" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(path)?;

        let sheet_names = workbook.sheet_names().to_owned();
        if sheet_names.is_empty() {
            return Err(ImportError::ExcelParseError(
                "Excel 文件无工作表".to_string(),
            ));
        }

        let find = |wanted: &str| {
            sheet_names
                .iter()
                .find(|name| name.trim().eq_ignore_ascii_case(wanted))
                .cloned()
        };

        let sheet_name = match sheet {
            SheetSelector::First => sheet_names[0].clone(),
            SheetSelector::Named(wanted) => find(wanted).ok_or_else(|| ImportError::MissingSheet {
                file: path.display().to_string(),
                sheet: wanted.clone(),
            })?,
            SheetSelector::PreferNamed(wanted) => {
                find(wanted).unwrap_or_else(|| sheet_names[0].clone())
            }
        };

        let range = workbook.worksheet_range(&sheet_name)?;

        // 提取表头（第一行）
        let mut rows_iter = range.rows();
        let header_row = match rows_iter.next() {
            Some(row) => row,
            None => return Ok(RawTable::default()),
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell_text(cell).trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (row_idx, data_row) in rows_iter.enumerate() {
            let cells = data_row.iter().map(cell_text).collect();
            push_row(&mut rows, &headers, row_idx + 1, cells);
        }

        Ok(RawTable { headers, rows })
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl UniversalFileParser {
    pub fn is_excel<P: AsRef<Path>>(file_path: P) -> bool {
        matches!(extension_of(file_path.as_ref()).as_str(), "xlsx" | "xls")
    }
}

impl FileParser for UniversalFileParser {
    fn parse_to_raw_table(&self, file_path: &Path, sheet: &SheetSelector) -> ImportResult<RawTable> {
        let ext = extension_of(file_path);
        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_table(file_path, sheet),
            "xlsx" | "xls" => ExcelParser.parse_to_raw_table(file_path, sheet),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file(&["store,model,display", "S001,WM-100,4", "S002, WM-200 ,2"]);

        let table = CsvParser
            .parse_to_raw_table(temp_file.path(), &SheetSelector::First)
            .unwrap();

        assert_eq!(table.headers, vec!["store", "model", "display"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0].get("store"), Some("S001"));
        assert_eq!(table.rows[1].get("model"), Some("WM-200"));
        assert_eq!(table.rows[1].row_number, 2);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("non_existent.csv"), &SheetSelector::First);
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let temp_file = csv_file(&["store,display", "S001,2", ",", "S002,3"]);

        let table = CsvParser
            .parse_to_raw_table(temp_file.path(), &SheetSelector::First)
            .unwrap();

        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1].row_number, 3);
    }

    #[test]
    fn test_csv_parser_strips_bom() {
        let temp_file = csv_file(&["\u{feff}store,display", "S001,2"]);

        let table = CsvParser
            .parse_to_raw_table(temp_file.path(), &SheetSelector::First)
            .unwrap();

        assert_eq!(table.headers[0], "store");
    }

    #[test]
    fn test_cell_text_conversion() {
        use calamine::CellErrorType;

        assert_eq!(cell_text(&Data::Float(10.0)), "10");
        assert_eq!(cell_text(&Data::Float(0.5)), "0.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::String(" TV-55 ".to_string())), " TV-55 ");
        assert_eq!(cell_text(&Data::Empty), "");
        assert_eq!(cell_text(&Data::Error(CellErrorType::NA)), "#N/A");
        assert_eq!(cell_text(&Data::Error(CellErrorType::Ref)), "#REF!");
    }

    #[test]
    fn test_excel_parser_sheet_selection() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dim_posm.xlsx");

        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("old_posm").unwrap();
        sheet.write_string(0, 0, "posm").unwrap();
        sheet.write_string(1, 0, "P-OLD").unwrap();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Price").unwrap();
        sheet.write_string(0, 0, "posm").unwrap();
        sheet.write_string(0, 1, "price").unwrap();
        sheet.write_string(1, 0, "P-STAND").unwrap();
        sheet.write_number(1, 1, 12.0).unwrap();
        workbook.save(&path).unwrap();

        let price = ExcelParser
            .parse_to_raw_table(&path, &SheetSelector::Named("price".to_string()))
            .unwrap();
        assert_eq!(price.rows[0].get("price"), Some("12"));

        let first = ExcelParser
            .parse_to_raw_table(&path, &SheetSelector::PreferNamed("posm".to_string()))
            .unwrap();
        assert_eq!(first.rows[0].get("posm"), Some("P-OLD"));

        let missing =
            ExcelParser.parse_to_raw_table(&path, &SheetSelector::Named("posm".to_string()));
        assert!(matches!(missing, Err(ImportError::MissingSheet { .. })));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result =
            UniversalFileParser.parse_to_raw_table(Path::new("input.txt"), &SheetSelector::First);
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
        assert!(UniversalFileParser::is_excel("dim_posm.XLSX"));
    }
}
