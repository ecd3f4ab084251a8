// ==========================================
// POSM 需求测算系统 - 报表导出
// ==========================================
// 输出目录: <out>/posm_cost_report_<YYYYMMDD_HHMMSS>/
//   posm_cost_report_<YYYYMMDD_HHMMSS>.xlsx（每个视图一个工作表）
//   posm_summary.csv / model_posm_summary.csv / address_summary.csv
//   care_summary.csv / sda_summary.csv / diagnostics.csv / dq_violations.csv
//   report.json（完整报表信封）
// 工作表名与表头按报表语言本地化（zh-CN / en）
// ==========================================

use crate::domain::quality::DqViolation;
use crate::domain::report::{AllocationReport, PosmSummaryRow, RunDiagnostics};
use crate::export::error::{ExportError, ExportResult};
use crate::i18n::{self, t_in, t_with_args};
use csv::Writer;
use rust_xlsxwriter::{Format, Workbook};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};

pub const REPORT_DIR_PREFIX: &str = "posm_cost_report_";
pub const REPORT_JSON: &str = "report.json";

fn money(value: f64) -> String {
    format!("{:.2}", value)
}

fn quantity(value: f64) -> String {
    let rounded = (value * 10_000.0).round() / 10_000.0;
    format!("{}", rounded)
}

// ==========================================
// 导出表格（工作簿与 CSV 共用）
// ==========================================
enum Cell {
    Text(String),
    Count(u64),
    Quantity(f64),
    Money(f64),
    Empty,
}

impl Cell {
    fn csv_text(&self) -> String {
        match self {
            Cell::Text(v) => v.clone(),
            Cell::Count(v) => v.to_string(),
            Cell::Quantity(v) => quantity(*v),
            Cell::Money(v) => money(*v),
            Cell::Empty => String::new(),
        }
    }
}

struct ExportTable {
    key: &'static str, // view.<key> 为工作表名; <key>.csv 为文件名
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

pub struct ReportWriter {
    locale: String,
}

impl ReportWriter {
    /// 创建导出器; 不支持的语言回退为默认语言
    pub fn new(locale: &str) -> Self {
        let locale = if i18n::is_supported_locale(locale) {
            locale
        } else {
            i18n::DEFAULT_LOCALE
        };
        Self {
            locale: locale.to_string(),
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    fn header(&self, keys: &[&str]) -> Vec<String> {
        keys.iter()
            .map(|k| t_in(&format!("column.{}", k), &self.locale))
            .collect()
    }

    /// 报表目录名（按生成时间）
    pub fn report_dir_name(report: &AllocationReport) -> String {
        format!(
            "{}{}",
            REPORT_DIR_PREFIX,
            report.generated_at.format("%Y%m%d_%H%M%S")
        )
    }

    /// 报表目录中的工作簿路径
    pub fn workbook_path(dir: &Path) -> PathBuf {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "posm_cost_report".to_string());
        dir.join(format!("{}.xlsx", name))
    }

    /// 写出整份报表
    ///
    /// # 参数
    /// - report: 报表
    /// - out_dir: 父目录（不存在时创建）
    ///
    /// # 返回
    /// 报表目录路径; 同名目录已存在时追加 run_id 前缀避免覆盖
    #[instrument(skip(self, report), fields(run_id = %report.run_id))]
    pub fn write(&self, report: &AllocationReport, out_dir: &Path) -> ExportResult<PathBuf> {
        fs::create_dir_all(out_dir)
            .map_err(|e| ExportError::OutputDir(format!("{}: {}", out_dir.display(), e)))?;

        let mut dir = out_dir.join(Self::report_dir_name(report));
        if dir.exists() {
            let suffix: String = report.run_id.chars().take(8).collect();
            dir = out_dir.join(format!("{}_{}", Self::report_dir_name(report), suffix));
        }
        fs::create_dir_all(&dir)?;

        let tables = self.build_tables(report);

        self.write_workbook(&Self::workbook_path(&dir), &tables)?;
        for table in &tables {
            write_csv(&dir.join(format!("{}.csv", table.key)), table)?;
        }

        let json = serde_json::to_string_pretty(report)?;
        fs::write(dir.join(REPORT_JSON), json)?;

        info!(path = %dir.display(), locale = %self.locale, sheets = tables.len(), "报表导出完成");
        Ok(dir)
    }

    fn build_tables(&self, report: &AllocationReport) -> Vec<ExportTable> {
        let views = &report.views;
        vec![
            self.posm_table("posm_summary", &views.posm_summary),
            self.model_posm_table(report),
            self.address_table(report),
            self.posm_table("care_summary", &views.care_summary.rows),
            self.posm_table("sda_summary", &views.sda_summary.rows),
            self.diagnostics_table(&report.diagnostics),
            self.violations_table(&report.dq_report.violations),
        ]
    }

    fn posm_table(&self, key: &'static str, rows: &[PosmSummaryRow]) -> ExportTable {
        ExportTable {
            key,
            headers: self.header(&[
                "posm_id",
                "raw_quantity",
                "allocated_quantity",
                "unit_price",
                "raw_cost",
                "total_cost",
                "line_count",
                "missing_price_lines",
            ]),
            rows: rows
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(row.posm_id.clone()),
                        Cell::Quantity(row.raw_quantity),
                        Cell::Count(row.allocated_quantity),
                        row.unit_price.map_or(Cell::Empty, Cell::Money),
                        Cell::Money(row.raw_cost),
                        Cell::Money(row.total_cost),
                        Cell::Count(row.line_count as u64),
                        Cell::Count(row.missing_price_lines as u64),
                    ]
                })
                .collect(),
        }
    }

    fn model_posm_table(&self, report: &AllocationReport) -> ExportTable {
        ExportTable {
            key: "model_posm_summary",
            headers: self.header(&[
                "model_id",
                "posm_id",
                "priority",
                "category_group",
                "display_count",
                "raw_quantity",
                "allocated_quantity",
                "total_cost",
                "missing_price_lines",
            ]),
            rows: report
                .views
                .model_posm_summary
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(row.model_id.clone()),
                        Cell::Text(row.posm_id.clone()),
                        Cell::Text(row.priority.to_string()),
                        Cell::Text(row.category_group.to_string()),
                        Cell::Count(row.display_count),
                        Cell::Quantity(row.raw_quantity),
                        Cell::Count(row.allocated_quantity),
                        Cell::Money(row.total_cost),
                        Cell::Count(row.missing_price_lines as u64),
                    ]
                })
                .collect(),
        }
    }

    fn address_table(&self, report: &AllocationReport) -> ExportTable {
        ExportTable {
            key: "address_summary",
            headers: self.header(&[
                "delivery_address",
                "store_count",
                "allocated_quantity",
                "total_cost",
                "missing_price_lines",
            ]),
            rows: report
                .views
                .address_summary
                .iter()
                .map(|row| {
                    vec![
                        Cell::Text(row.delivery_address.clone()),
                        Cell::Count(row.store_count as u64),
                        Cell::Count(row.allocated_quantity),
                        Cell::Money(row.total_cost),
                        Cell::Count(row.missing_price_lines as u64),
                    ]
                })
                .collect(),
        }
    }

    fn diagnostics_table(&self, d: &RunDiagnostics) -> ExportTable {
        let metrics: [(&str, Cell); 11] = [
            ("observations_in", Cell::Count(d.observations_in as u64)),
            ("merged_duplicates", Cell::Count(d.merged_duplicates as u64)),
            ("dropped_unknown_store", Cell::Count(d.dropped_unknown_store as u64)),
            ("dropped_unknown_model", Cell::Count(d.dropped_unknown_model as u64)),
            ("dropped_invalid_priority", Cell::Count(d.dropped_invalid_priority as u64)),
            ("resolved_pairs", Cell::Count(d.resolved_pairs as u64)),
            ("allocation_lines", Cell::Count(d.allocation_lines as u64)),
            ("zero_quantity_lines", Cell::Count(d.zero_quantity_lines as u64)),
            ("missing_price_lines", Cell::Count(d.missing_price_lines as u64)),
            ("missing_price_posm_ids", Cell::Text(d.missing_price_posm_ids.join(";"))),
            ("stores_without_address", Cell::Count(d.stores_without_address as u64)),
        ];

        ExportTable {
            key: "diagnostics",
            headers: self.header(&["metric", "value"]),
            rows: metrics
                .into_iter()
                .map(|(key, value)| {
                    vec![
                        Cell::Text(t_in(&format!("diagnostics.{}", key), &self.locale)),
                        value,
                    ]
                })
                .collect(),
        }
    }

    fn violations_table(&self, violations: &[DqViolation]) -> ExportTable {
        ExportTable {
            key: "dq_violations",
            headers: self.header(&["table", "row_number", "key", "level", "field", "message"]),
            rows: violations
                .iter()
                .map(|v| {
                    vec![
                        Cell::Text(v.table.to_string()),
                        Cell::Count(v.row_number as u64),
                        v.key.clone().map_or(Cell::Empty, Cell::Text),
                        Cell::Text(v.level.to_string()),
                        Cell::Text(v.field.clone()),
                        Cell::Text(v.message.clone()),
                    ]
                })
                .collect(),
        }
    }

    fn write_workbook(&self, path: &Path, tables: &[ExportTable]) -> ExportResult<()> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();
        let money_format = Format::new().set_num_format("0.00");

        for table in tables {
            let sheet_name = t_in(&format!("view.{}", table.key), &self.locale);
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name.as_str())?;

            for (col, header) in table.headers.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, header.as_str(), &header_format)?;
            }
            for (idx, row) in table.rows.iter().enumerate() {
                let r = idx as u32 + 1;
                for (col, cell) in row.iter().enumerate() {
                    let c = col as u16;
                    match cell {
                        Cell::Text(v) => {
                            sheet.write_string(r, c, v.as_str())?;
                        }
                        Cell::Count(v) => {
                            sheet.write_number(r, c, *v as f64)?;
                        }
                        Cell::Quantity(v) => {
                            sheet.write_number(r, c, *v)?;
                        }
                        Cell::Money(v) => {
                            sheet.write_number_with_format(r, c, *v, &money_format)?;
                        }
                        Cell::Empty => {}
                    }
                }
            }
            debug!(sheet = %sheet_name, rows = table.rows.len(), "工作表写入完成");
        }

        workbook.save(path)?;
        Ok(())
    }

    /// 控制台摘要（本地化）
    pub fn render_summary(&self, report: &AllocationReport) -> String {
        let views = &report.views;
        let d = &report.diagnostics;
        let total_allocated = views.total_allocated().to_string();
        let total_cost = money(views.total_cost());
        let raw_cost = money(views.total_raw_cost());
        let dropped = d.dropped_total().to_string();

        let mut lines = vec![
            t_with_args("summary.header", &self.locale, &[("run_id", report.run_id.as_str())]),
            t_with_args(
                "summary.total_allocated",
                &self.locale,
                &[("quantity", total_allocated.as_str())],
            ),
            t_with_args("summary.total_cost", &self.locale, &[("cost", total_cost.as_str())]),
            t_with_args("summary.raw_cost", &self.locale, &[("cost", raw_cost.as_str())]),
            t_with_args("summary.dropped", &self.locale, &[("count", dropped.as_str())]),
        ];
        if !d.missing_price_posm_ids.is_empty() {
            let posm_ids = d.missing_price_posm_ids.join(", ");
            lines.push(t_with_args(
                "summary.missing_price",
                &self.locale,
                &[("posm_ids", posm_ids.as_str())],
            ));
        }
        lines.join("\n")
    }
}

fn write_csv(path: &Path, table: &ExportTable) -> ExportResult<()> {
    let mut wtr = Writer::from_path(path)?;
    wtr.write_record(&table.headers)?;
    for row in &table.rows {
        wtr.write_record(row.iter().map(Cell::csv_text))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::quality::DqReport;
    use crate::domain::report::{GroupSummary, ReportViews};
    use crate::domain::types::CategoryGroup;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn report() -> AllocationReport {
        let row = PosmSummaryRow {
            posm_id: "P-STAND".to_string(),
            raw_quantity: 13.0,
            allocated_quantity: 15,
            unit_price: Some(2.5),
            raw_cost: 32.5,
            total_cost: 37.5,
            line_count: 1,
            missing_price_lines: 0,
        };
        AllocationReport {
            run_id: "0123456789abcdef".to_string(),
            generated_at: Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap(),
            views: ReportViews {
                posm_summary: vec![row.clone()],
                model_posm_summary: vec![],
                address_summary: vec![],
                care_summary: GroupSummary {
                    category_group: CategoryGroup::Care,
                    rows: vec![row],
                },
                sda_summary: GroupSummary {
                    category_group: CategoryGroup::Sda,
                    rows: vec![],
                },
            },
            diagnostics: RunDiagnostics {
                missing_price_posm_ids: vec!["P-TAG".to_string()],
                ..RunDiagnostics::default()
            },
            dq_report: DqReport::default(),
            config_snapshot: "{}".to_string(),
        }
    }

    #[test]
    fn test_report_dir_name() {
        assert_eq!(
            ReportWriter::report_dir_name(&report()),
            "posm_cost_report_20260301_083000"
        );
    }

    #[test]
    fn test_write_creates_all_files() {
        let out = TempDir::new().unwrap();
        let writer = ReportWriter::new("en");

        let dir = writer.write(&report(), out.path()).unwrap();

        assert!(ReportWriter::workbook_path(&dir)
            .ends_with("posm_cost_report_20260301_083000/posm_cost_report_20260301_083000.xlsx"));
        for name in [
            "posm_cost_report_20260301_083000.xlsx",
            "posm_summary.csv",
            "model_posm_summary.csv",
            "address_summary.csv",
            "care_summary.csv",
            "sda_summary.csv",
            "diagnostics.csv",
            "dq_violations.csv",
            REPORT_JSON,
        ] {
            assert!(dir.join(name).exists(), "missing {}", name);
        }

        let csv = fs::read_to_string(dir.join("posm_summary.csv")).unwrap();
        assert!(csv.starts_with("POSM ID,"));
        assert!(csv.contains("P-STAND,13,15,2.50,32.50,37.50,1,0"));
    }

    #[test]
    fn test_workbook_has_one_sheet_per_view() {
        use crate::importer::{ExcelParser, FileParser, SheetSelector};

        let out = TempDir::new().unwrap();
        let dir = ReportWriter::new("en").write(&report(), out.path()).unwrap();
        let workbook = ReportWriter::workbook_path(&dir);

        let posm = ExcelParser
            .parse_to_raw_table(&workbook, &SheetSelector::Named("POSM summary".to_string()))
            .unwrap();
        assert_eq!(posm.rows.len(), 1);
        assert_eq!(posm.rows[0].get("POSM ID"), Some("P-STAND"));
        assert_eq!(posm.rows[0].get("Allocated quantity"), Some("15"));
        assert_eq!(posm.rows[0].get("Raw-quantity cost"), Some("32.5"));

        for sheet in [
            "Model x POSM summary",
            "Address summary",
            "Care group summary",
            "SDA group summary",
            "Run diagnostics",
            "Data quality violations",
        ] {
            let parsed =
                ExcelParser.parse_to_raw_table(&workbook, &SheetSelector::Named(sheet.to_string()));
            assert!(parsed.is_ok(), "missing sheet {}", sheet);
        }
    }

    #[test]
    fn test_write_does_not_overwrite_existing_dir() {
        let out = TempDir::new().unwrap();
        let writer = ReportWriter::new("zh-CN");

        let first = writer.write(&report(), out.path()).unwrap();
        let second = writer.write(&report(), out.path()).unwrap();

        assert_ne!(first, second);
        assert!(second.ends_with("posm_cost_report_20260301_083000_01234567"));
    }

    #[test]
    fn test_report_json_round_trips() {
        let out = TempDir::new().unwrap();
        let dir = ReportWriter::new("en").write(&report(), out.path()).unwrap();

        let json = fs::read_to_string(dir.join(REPORT_JSON)).unwrap();
        let parsed: AllocationReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.views, report().views);
    }

    #[test]
    fn test_unsupported_locale_falls_back() {
        assert_eq!(ReportWriter::new("fr").locale(), "zh-CN");
    }

    #[test]
    fn test_render_summary_mentions_missing_price() {
        let text = ReportWriter::new("en").render_summary(&report());
        assert!(text.contains("Total allocated: 15"));
        assert!(text.contains("Cost at raw quantity: 32.50"));
        assert!(text.contains("P-TAG"));
    }
}
