// ==========================================
// POSM 需求测算系统 - 命令行入口
// ==========================================
// 子命令:
//   run    单次报表（显式指定输入文件）
//   batch  按目录批量生成报表（并发,互相独立）
//   config 输出生效配置
// ==========================================

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use posm_allocation::config::AllocationConfigReader;
use posm_allocation::i18n::t_with_args;
use posm_allocation::{logging, ConfigManager, InputPaths, ReportApi, ReportWriter};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "posm-allocation", version, about = "POSM allocation & cost report")]
struct Cli {
    #[arg(long, global = true, help = "Config file (JSON, flat key/value)")]
    config: Option<PathBuf>,
    #[arg(long, global = true, help = "Output machine-readable JSON")]
    json: bool,
    #[arg(long, global = true, help = "Emit logs as JSON")]
    log_json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Run {
        #[arg(long)]
        fact_display: PathBuf,
        #[arg(long)]
        store_list: PathBuf,
        #[arg(long)]
        model: PathBuf,
        #[arg(long, help = "Workbook with posm/price sheets, or posm CSV")]
        posm: PathBuf,
        #[arg(long, help = "Price CSV when --posm is not a workbook")]
        price: Option<PathBuf>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Batch {
        #[arg(required = true)]
        dirs: Vec<PathBuf>,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
    Config,
}

#[derive(Serialize)]
struct JsonOut<T: Serialize> {
    ok: bool,
    data: T,
}

#[derive(Serialize)]
struct BatchEntry {
    input: String,
    ok: bool,
    output: Option<String>,
    error: Option<String>,
}

impl BatchEntry {
    fn written(input: String, dir: &Path) -> Self {
        Self {
            input,
            ok: true,
            output: Some(dir.display().to_string()),
            error: None,
        }
    }

    fn failed(input: String, error: String) -> Self {
        Self {
            input,
            ok: false,
            output: None,
            error: Some(error),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.log_json {
        logging::init_json();
    } else {
        logging::init();
    }

    tracing::info!(version = posm_allocation::VERSION, "{}", posm_allocation::APP_NAME);

    let config = ConfigManager::load(cli.config.as_deref()).context("配置加载失败")?;

    match cli.command {
        Commands::Run {
            fact_display,
            store_list,
            model,
            posm,
            price,
            out,
        } => {
            let mut paths = InputPaths::new(fact_display, store_list, model, posm);
            if let Some(price) = price {
                paths = paths.with_price(price);
            }

            let locale = config.get_report_locale().await?;
            let api = ReportApi::new(Arc::new(config));
            let report = api.generate_report(&paths).await?;

            let writer = ReportWriter::new(&locale);
            let dir = writer.write(&report, &out)?;

            if cli.json {
                print_json(true, &report)?;
            } else {
                println!("{}", writer.render_summary(&report));
                let path = dir.display().to_string();
                println!("{}", t_with_args("summary.written", &locale, &[("path", path.as_str())]));
            }
        }
        Commands::Batch { dirs, out } => {
            let locale = config.get_report_locale().await?;
            let api = ReportApi::new(Arc::new(config));
            let writer = ReportWriter::new(&locale);

            let discovered: Vec<(String, Result<InputPaths, String>)> = dirs
                .iter()
                .map(|dir| {
                    let found = InputPaths::from_dir(dir).map_err(|e| e.to_string());
                    (dir.display().to_string(), found)
                })
                .collect();
            let requests: Vec<InputPaths> = discovered
                .iter()
                .filter_map(|(_, found)| found.as_ref().ok().cloned())
                .collect();

            let outcomes: Vec<Result<PathBuf, String>> = api
                .batch_generate(requests)
                .await
                .into_iter()
                .map(|item| {
                    let report = item.result.map_err(|e| e.to_string())?;
                    writer.write(&report, &out).map_err(|e| e.to_string())
                })
                .collect();
            let entries = merge_batch_entries(discovered, outcomes);

            let failed = entries.iter().filter(|e| !e.ok).count();
            if cli.json {
                print_json(failed == 0, &entries)?;
            } else {
                for entry in &entries {
                    match (&entry.output, &entry.error) {
                        (Some(output), _) => println!(
                            "{}",
                            t_with_args("summary.written", &locale, &[("path", output.as_str())])
                        ),
                        (None, Some(error)) => eprintln!(
                            "{}",
                            t_with_args(
                                "summary.batch_failed",
                                &locale,
                                &[("path", entry.input.as_str()), ("error", error.as_str())]
                            )
                        ),
                        (None, None) => {}
                    }
                }
            }

            if failed > 0 {
                bail!("{} / {} 个请求失败", failed, entries.len());
            }
        }
        Commands::Config => {
            let snapshot = config.get_config_snapshot()?;
            if cli.json {
                let value: serde_json::Value = serde_json::from_str(&snapshot)?;
                print_json(true, &value)?;
            } else {
                println!("{}", snapshot);
            }
        }
    }

    Ok(())
}

/// 按输入目录顺序合并: 定位失败的目录与批量结果（与成功定位的目录同序）交织
fn merge_batch_entries(
    discovered: Vec<(String, Result<InputPaths, String>)>,
    outcomes: Vec<Result<PathBuf, String>>,
) -> Vec<BatchEntry> {
    let mut outcomes = outcomes.into_iter();
    discovered
        .into_iter()
        .map(|(input, found)| match found {
            Err(error) => BatchEntry::failed(input, error),
            Ok(_) => match outcomes.next() {
                Some(Ok(dir)) => BatchEntry::written(input, &dir),
                Some(Err(error)) => BatchEntry::failed(input, error),
                None => BatchEntry::failed(input, "批量结果缺失".to_string()),
            },
        })
        .collect()
}

fn print_json<T: Serialize>(ok: bool, data: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&JsonOut { ok, data })?);
    Ok(())
}
