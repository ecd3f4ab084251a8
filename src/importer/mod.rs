// ==========================================
// POSM 需求测算系统 - 导入层
// ==========================================
// 职责: 外部表格（Excel / CSV）→ 清洗后的输入表
// 红线: 结构性错误在任何引擎阶段之前中止
// ==========================================

// 模块声明
pub mod data_cleaner;
pub mod dq_validator;
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod input_loader;
pub mod input_loader_trait;
pub mod input_paths;

// 重导出核心类型
pub use data_cleaner::DataCleaner;
pub use dq_validator::DqValidator;
pub use error::{ImportError, ImportResult};
pub use field_mapper::FieldMapper;
pub use file_parser::{CsvParser, ExcelParser, RawRow, RawTable, SheetSelector, UniversalFileParser};
pub use input_loader::{InputLoaderImpl, LoadedInputs};
pub use input_paths::InputPaths;

// 重导出 Trait 接口
pub use input_loader_trait::{FileParser, InputLoader};
