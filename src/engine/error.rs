// ==========================================
// POSM 需求测算系统 - 引擎层错误类型
// ==========================================
// 红线: 引擎错误在任何计算阶段之前抛出,不产生部分报表
// ==========================================

use crate::config::ConfigError;
use crate::domain::quality::InputTable;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// 输入表结构错误（重复主键、非法数值等）
    #[error("输入数据不合法 ({table}): {message}")]
    MalformedInput { table: InputTable, message: String },

    /// 分配规则不合法（批量为 0、缓冲系数 < 1 等）
    #[error("分配规则不合法 ({key}): {message}")]
    InvalidRule { key: String, message: String },

    #[error("配置读取失败: {0}")]
    Config(#[from] ConfigError),
}

impl EngineError {
    pub fn malformed(table: InputTable, message: impl Into<String>) -> Self {
        EngineError::MalformedInput {
            table,
            message: message.into(),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
