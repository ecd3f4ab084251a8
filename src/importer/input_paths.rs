// ==========================================
// POSM 需求测算系统 - 输入文件定位
// ==========================================
// 约定文件名（不含扩展名,大小写不敏感）:
//   fact_display / dim_storelist / dim_model / dim_posm [/ dim_price]
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const FACT_DISPLAY_STEM: &str = "fact_display";
pub const STORE_LIST_STEM: &str = "dim_storelist";
pub const MODEL_STEM: &str = "dim_model";
pub const POSM_STEM: &str = "dim_posm";
pub const PRICE_STEMS: &[&str] = &["dim_price", "price_posm", "price"];

const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "xls", "csv"];

/// 一次报表运行的输入文件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputPaths {
    pub fact_display: PathBuf,
    pub store_list: PathBuf,
    pub model: PathBuf,
    pub posm: PathBuf,
    /// 单独的价格文件; None 表示取 posm 工作簿中的 price 工作表
    pub price: Option<PathBuf>,
}

impl InputPaths {
    pub fn new(
        fact_display: impl Into<PathBuf>,
        store_list: impl Into<PathBuf>,
        model: impl Into<PathBuf>,
        posm: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fact_display: fact_display.into(),
            store_list: store_list.into(),
            model: model.into(),
            posm: posm.into(),
            price: None,
        }
    }

    pub fn with_price(mut self, price: impl Into<PathBuf>) -> Self {
        self.price = Some(price.into());
        self
    }

    /// 按约定文件名在目录中定位输入文件
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> ImportResult<Self> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(ImportError::FileNotFound(dir.display().to_string()));
        }

        let mut files: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.is_file())
            .collect();
        files.sort();

        let find = |stem: &str| -> Option<PathBuf> {
            files
                .iter()
                .find(|p| {
                    let stem_matches = p
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .map_or(false, |s| s.eq_ignore_ascii_case(stem));
                    let ext_supported = p
                        .extension()
                        .and_then(|e| e.to_str())
                        .map_or(false, |e| {
                            SUPPORTED_EXTENSIONS
                                .iter()
                                .any(|s| e.eq_ignore_ascii_case(s))
                        });
                    stem_matches && ext_supported
                })
                .cloned()
        };

        let require = |stem: &str| -> ImportResult<PathBuf> {
            find(stem).ok_or_else(|| {
                ImportError::FileNotFound(format!("{}/{}.(xlsx|xls|csv)", dir.display(), stem))
            })
        };

        Ok(Self {
            fact_display: require(FACT_DISPLAY_STEM)?,
            store_list: require(STORE_LIST_STEM)?,
            model: require(MODEL_STEM)?,
            posm: require(POSM_STEM)?,
            price: PRICE_STEMS.iter().find_map(|stem| find(stem)),
        })
    }
}
