// ==========================================
// POSM 需求测算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: JSON 配置文件 (key-value, global scope),缺失键回落默认值
// ==========================================

use crate::config::allocation_config_trait::AllocationConfigReader;
use crate::config::error::{ConfigError, ConfigResult};
use crate::domain::types::UnknownAddressPolicy;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct ConfigManager {
    values: BTreeMap<String, String>,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// 创建仅含内置默认值的 ConfigManager
    pub fn new() -> Self {
        Self::default()
    }

    /// 从 JSON 配置文件加载
    ///
    /// # 文件格式
    /// 扁平对象: {"allocation.buffer_multiplier": 1.3, "report.locale": "en"}
    /// 值可为字符串、数字或布尔,统一按字符串保存
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let raw = std::fs::read_to_string(path)?;
        let mut manager = Self::from_json(&raw)?;
        manager.source = Some(path.to_path_buf());

        tracing::info!(
            config_path = %path.display(),
            keys = manager.values.len(),
            "配置文件加载完成"
        );
        Ok(manager)
    }

    /// 从 JSON 字符串加载
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        let parsed: BTreeMap<String, Value> = serde_json::from_str(raw)?;

        let mut values = BTreeMap::new();
        for (key, value) in parsed {
            let text = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Array(items) => items
                    .iter()
                    .map(|v| match v {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    })
                    .collect::<Vec<_>>()
                    .join(","),
                Value::Null => continue,
                Value::Object(_) => {
                    return Err(ConfigError::ConfigValueError {
                        key,
                        value: value.to_string(),
                        message: "不支持嵌套对象".to_string(),
                    })
                }
            };
            values.insert(key, text);
        }

        Ok(Self {
            values,
            source: None,
        })
    }

    /// 加载配置: 显式路径 > 用户配置目录 > 内置默认值
    pub fn load(explicit: Option<&Path>) -> ConfigResult<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        match get_default_config_path() {
            Some(path) if path.exists() => Self::from_file(path),
            _ => {
                tracing::debug!("未找到配置文件，使用内置默认值");
                Ok(Self::new())
            }
        }
    }

    /// 覆写配置值
    pub fn set_config_value(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    /// 读取 global scope 的配置值
    pub fn get_config_value(&self, key: &str) -> Option<String> {
        self.values
            .get(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// 读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> String {
        self.get_config_value(key)
            .unwrap_or_else(|| default.to_string())
    }

    /// 配置来源文件
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// 获取生效配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 随报表输出,保证同一份输入可按相同口径复算
    pub fn get_config_snapshot(&self) -> ConfigResult<String> {
        let mut effective: BTreeMap<String, String> = config_keys::DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (key, value) in &self.values {
            effective.insert(key.clone(), value.clone());
        }
        Ok(serde_json::to_string(&effective)?)
    }

    fn parse_f64(&self, key: &str, default: &str) -> ConfigResult<f64> {
        let value = self.get_config_or_default(key, default);
        value
            .parse::<f64>()
            .map_err(|e| ConfigError::ConfigValueError {
                key: key.to_string(),
                value: value.clone(),
                message: e.to_string(),
            })
    }

    fn parse_u64(&self, key: &str, default: &str) -> ConfigResult<u64> {
        let value = self.get_config_or_default(key, default);
        value
            .parse::<u64>()
            .map_err(|e| ConfigError::ConfigValueError {
                key: key.to_string(),
                value: value.clone(),
                message: e.to_string(),
            })
    }
}

// ==========================================
// AllocationConfigReader Trait 实现
// ==========================================
#[async_trait]
impl AllocationConfigReader for ConfigManager {
    async fn get_buffer_multiplier(&self) -> ConfigResult<f64> {
        self.parse_f64(
            config_keys::BUFFER_MULTIPLIER,
            config_keys::default_value(config_keys::BUFFER_MULTIPLIER),
        )
    }

    async fn get_batch_size(&self) -> ConfigResult<u64> {
        self.parse_u64(
            config_keys::BATCH_SIZE,
            config_keys::default_value(config_keys::BATCH_SIZE),
        )
    }

    async fn get_unknown_address_policy(&self) -> ConfigResult<UnknownAddressPolicy> {
        let policy = self.get_config_or_default(
            config_keys::UNKNOWN_ADDRESS_POLICY,
            config_keys::default_value(config_keys::UNKNOWN_ADDRESS_POLICY),
        );

        match policy.to_uppercase().as_str() {
            "SENTINEL" => {
                let label = self.get_config_or_default(
                    config_keys::UNKNOWN_ADDRESS_LABEL,
                    config_keys::default_value(config_keys::UNKNOWN_ADDRESS_LABEL),
                );
                Ok(UnknownAddressPolicy::Sentinel(label))
            }
            "DROP" => Ok(UnknownAddressPolicy::Drop),
            _ => Err(ConfigError::ConfigValueError {
                key: config_keys::UNKNOWN_ADDRESS_POLICY.to_string(),
                value: policy,
                message: "仅支持 SENTINEL 或 DROP".to_string(),
            }),
        }
    }

    async fn get_report_locale(&self) -> ConfigResult<String> {
        let locale = self.get_config_or_default(
            config_keys::REPORT_LOCALE,
            config_keys::default_value(config_keys::REPORT_LOCALE),
        );

        if crate::i18n::is_supported_locale(&locale) {
            Ok(locale)
        } else {
            Err(ConfigError::ConfigValueError {
                key: config_keys::REPORT_LOCALE.to_string(),
                value: locale,
                message: "仅支持 zh-CN 或 en".to_string(),
            })
        }
    }

    async fn get_care_categories(&self) -> ConfigResult<Vec<String>> {
        let value = self.get_config_or_default(
            config_keys::CARE_CATEGORIES,
            config_keys::default_value(config_keys::CARE_CATEGORIES),
        );

        let categories: Vec<String> = value
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();

        if categories.is_empty() {
            Err(ConfigError::ConfigValueError {
                key: config_keys::CARE_CATEGORIES.to_string(),
                value,
                message: "Care 品类列表为空".to_string(),
            })
        } else {
            Ok(categories)
        }
    }
}

/// 用户级默认配置文件路径: <config_dir>/posm-allocation/config.json
pub fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("posm-allocation").join("config.json"))
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 分配规则
    pub const BUFFER_MULTIPLIER: &str = "allocation.buffer_multiplier";
    pub const BATCH_SIZE: &str = "allocation.batch_size";

    // 地址汇总口径
    pub const UNKNOWN_ADDRESS_POLICY: &str = "report.unknown_address_policy";
    pub const UNKNOWN_ADDRESS_LABEL: &str = "report.unknown_address_label";

    // 报表语言
    pub const REPORT_LOCALE: &str = "report.locale";

    // 品类归组（逗号分隔）
    pub const CARE_CATEGORIES: &str = "catalog.care_categories";

    pub const DEFAULTS: &[(&str, &str)] = &[
        (BUFFER_MULTIPLIER, "1.3"),
        (BATCH_SIZE, "5"),
        (UNKNOWN_ADDRESS_POLICY, "SENTINEL"),
        (UNKNOWN_ADDRESS_LABEL, "Unknown address"),
        (REPORT_LOCALE, "zh-CN"),
        (
            CARE_CATEGORIES,
            "FL WASHER,FRONT LOAD WASHER,WASHER FL,WM FL,WASHER DRYER,DRYER,TUMBLE DRYER",
        ),
    ];

    /// 内置默认值
    pub fn default_value(key: &str) -> &'static str {
        DEFAULTS
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
            .unwrap_or("")
    }
}
