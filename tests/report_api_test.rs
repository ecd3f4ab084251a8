// ==========================================
// ReportApi 集成测试
// ==========================================
// 测试目标: 文件 → 报表信封 → 导出; 批量请求互相独立
// ==========================================

mod helpers;

use helpers::mock_config::MockConfig;
use helpers::test_data_builder::{
    csv_input_dir, overwrite, standard_tables, write_workbook, xlsx_input_dir, PRICE_CSV,
};
use posm_allocation::api::{ApiError, ReportApi};
use posm_allocation::export::ReportWriter;
use posm_allocation::importer::{ExcelParser, FileParser, InputPaths, SheetSelector};
use posm_allocation::logging;
use std::sync::Arc;
use tempfile::TempDir;

fn api(config: MockConfig) -> ReportApi<MockConfig> {
    ReportApi::new(Arc::new(config))
}

#[tokio::test]
async fn test_generate_report_from_csv() {
    logging::init_test();
    let (_dir, paths) = csv_input_dir();

    let report = api(MockConfig::default()).generate_report(&paths).await.unwrap();

    assert!(!report.run_id.is_empty());
    assert_eq!(report.views.total_allocated(), 95);
    assert_eq!(report.views.total_cost(), 500.0);
    assert_eq!(report.diagnostics.observations_in, 6);
    assert_eq!(report.diagnostics.dropped_unknown_store, 1);
    assert_eq!(report.diagnostics.dropped_invalid_priority, 1);
    assert_eq!(report.diagnostics.missing_price_posm_ids, vec!["P-WOBBLER".to_string()]);
    assert_eq!(report.dq_report.summary.blocked, 1);
}

#[tokio::test]
async fn test_report_carries_config_snapshot() {
    let report = api(MockConfig::with_batch(10))
        .run_tables(standard_tables())
        .await
        .unwrap();

    let snapshot: serde_json::Value = serde_json::from_str(&report.config_snapshot).unwrap();
    assert_eq!(snapshot["batch_size"], 10);
    assert_eq!(snapshot["report_locale"], "en");
    // 批量 10: 所有分配量为 10 的倍数
    assert!(report
        .views
        .posm_summary
        .iter()
        .all(|r| r.allocated_quantity % 10 == 0));
}

#[tokio::test]
async fn test_invalid_rule_aborts_run() {
    let result = api(MockConfig::with_batch(0)).run_tables(standard_tables()).await;
    assert!(matches!(result, Err(ApiError::Engine(_))));
}

#[tokio::test]
async fn test_malformed_input_yields_no_report() {
    let (_dir, paths) = csv_input_dir();
    overwrite(&paths, "model", "model,priority\nWM-FL-100,1\n");

    let err = api(MockConfig::default()).generate_report(&paths).await.unwrap_err();
    assert!(err.is_malformed_input());
}

#[tokio::test]
async fn test_drop_policy_from_config() {
    let report = api(MockConfig::drop_unknown_address())
        .run_tables(standard_tables())
        .await
        .unwrap();

    assert!(report
        .views
        .address_summary
        .iter()
        .all(|r| r.delivery_address != "Unknown address"));
}

#[tokio::test]
async fn test_batch_requests_are_independent() {
    let (_good_dir, good) = csv_input_dir();
    let (_bad_dir, bad) = csv_input_dir();
    overwrite(&bad, "fact_display", "store,model\nStore A,TV-55\n");
    let missing = InputPaths::new("nope/fd.csv", "nope/s.csv", "nope/m.csv", "nope/p.csv")
        .with_price("nope/price.csv");

    let results = api(MockConfig::default())
        .batch_generate(vec![good.clone(), bad.clone(), missing, good.clone()])
        .await;

    assert_eq!(results.len(), 4);
    assert_eq!(results[0].paths, good);
    assert!(results[0].result.is_ok());
    assert!(results[1].result.as_ref().unwrap_err().is_malformed_input());
    assert!(results[2].result.is_err());

    let first = results[0].result.as_ref().unwrap();
    let last = results[3].result.as_ref().unwrap();
    assert_ne!(first.run_id, last.run_id);
    assert_eq!(first.views, last.views);
}

#[tokio::test]
async fn test_export_written_report() {
    let (_dir, paths) = csv_input_dir();
    let out = TempDir::new().unwrap();

    let report = api(MockConfig::default()).generate_report(&paths).await.unwrap();
    let dir = ReportWriter::new("en").write(&report, out.path()).unwrap();

    let name = dir.file_name().unwrap().to_string_lossy().to_string();
    assert!(name.starts_with("posm_cost_report_"));

    let address = std::fs::read_to_string(dir.join("address_summary.csv")).unwrap();
    assert!(address.contains("Unknown address"));
    assert!(address.starts_with("Delivery address,"));

    let violations = std::fs::read_to_string(dir.join("dq_violations.csv")).unwrap();
    assert!(violations.contains("OLD-1"));

    let workbook = ReportWriter::workbook_path(&dir);
    assert!(workbook.exists());
    let posm = ExcelParser
        .parse_to_raw_table(&workbook, &SheetSelector::Named("POSM summary".to_string()))
        .unwrap();
    let ids: Vec<&str> = posm.rows.iter().filter_map(|r| r.get("POSM ID")).collect();
    assert_eq!(ids, vec!["P-STAND", "P-STICKER", "P-WOBBLER"]);
}

#[tokio::test]
async fn test_generate_report_from_workbooks() {
    let (_dir, paths) = xlsx_input_dir();

    let report = api(MockConfig::default()).generate_report(&paths).await.unwrap();

    assert_eq!(report.views.total_allocated(), 95);
    assert_eq!(report.views.total_cost(), 500.0);
    assert_eq!(report.diagnostics.dropped_invalid_priority, 1);
}

#[tokio::test]
async fn test_workbook_without_posm_sheet_yields_no_report() {
    let (_dir, paths) = xlsx_input_dir();
    write_workbook(
        &paths.posm,
        &[("old_posm_2023", "model,posm,ratio\nTV-55,P-OLD,2\n"), ("price", PRICE_CSV)],
    );

    let err = api(MockConfig::default()).generate_report(&paths).await.unwrap_err();
    assert!(err.is_malformed_input());
}
