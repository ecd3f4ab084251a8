// ==========================================
// POSM 需求测算系统 - 配置层
// ==========================================
// 职责: 报表口径配置,支持配置文件覆写内置默认值
// 存储: JSON 配置文件 (扁平 key-value)
// ==========================================

pub mod allocation_config_trait;
pub mod config_manager;
pub mod error;

// 重导出核心配置管理器
pub use allocation_config_trait::AllocationConfigReader;
pub use config_manager::{config_keys, get_default_config_path, ConfigManager};
pub use error::{ConfigError, ConfigResult};
