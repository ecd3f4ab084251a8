// ==========================================
// POSM 需求测算系统 - API层错误类型
// ==========================================
// 职责: 汇总导入 / 引擎 / 配置 / 导出错误
// 红线: 任一错误均中止当次报表,不产生部分报表
// ==========================================

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::export::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 分层错误
    // ==========================================
    #[error("输入加载失败: {0}")]
    Import(#[from] ImportError),

    #[error("测算失败: {0}")]
    Engine(#[from] EngineError),

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("报表导出失败: {0}")]
    Export(#[from] ExportError),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 是否为输入结构性错误（缺列 / 缺表 / 非数值 / 重复主键）
    pub fn is_malformed_input(&self) -> bool {
        match self {
            ApiError::Import(e) => e.is_malformed_input(),
            ApiError::Engine(EngineError::MalformedInput { .. }) => true,
            _ => false,
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
