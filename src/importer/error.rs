// ==========================================
// POSM 需求测算系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 结构性错误（缺列/缺表/非数值）一律中止整次运行
// ==========================================

use crate::config::ConfigError;
use crate::domain::quality::InputTable;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("工作表缺失 ({file}): 需要 '{sheet}' 工作表")]
    MissingSheet { file: String, sheet: String },

    // ===== 结构错误 =====
    #[error("必填列缺失 ({table}): 需要以下任一列 {expected}")]
    MissingColumn { table: InputTable, expected: String },

    // ===== 数据映射错误 =====
    #[error("类型转换失败 ({table} 行 {row}, 字段 {field}): {message}")]
    TypeConversionError {
        table: InputTable,
        row: usize,
        field: String,
        message: String,
    },

    #[error("数值范围错误 ({table} 行 {row}, 字段 {field}): 值 {value} 不得为负数")]
    ValueRangeError {
        table: InputTable,
        row: usize,
        field: String,
        value: f64,
    },

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    Config(#[from] ConfigError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为输入结构性错误（缺列/缺表/非数值）
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ImportError::MissingSheet { .. }
                | ImportError::MissingColumn { .. }
                | ImportError::TypeConversionError { .. }
                | ImportError::ValueRangeError { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
