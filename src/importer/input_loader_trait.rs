// ==========================================
// POSM 需求测算系统 - 输入加载 Trait
// ==========================================
// 职责: 定义输入加载接口（不包含实现）
// ==========================================

use crate::importer::error::ImportResult;
use crate::importer::file_parser::{RawTable, SheetSelector};
use crate::importer::input_paths::InputPaths;
use crate::importer::LoadedInputs;
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// InputLoader Trait
// ==========================================
// 用途: 报表输入加载主接口
// 实现者: InputLoaderImpl
#[async_trait]
pub trait InputLoader: Send + Sync {
    /// 加载一次报表运行所需的全部输入表
    ///
    /// # 参数
    /// - paths: 四个输入文件（dim_posm 为 Excel 时含 posm/price 两个工作表）
    ///
    /// # 返回
    /// - Ok(LoadedInputs): 清洗后的输入表 + DQ 报告
    /// - Err: 文件缺失、缺表、缺列、数值列非数值（整次运行中止）
    ///
    /// # 加载流程
    /// 1. 文件读取与解析
    /// 2. 列名解析（缺列即中止,先于任何逐行处理）
    /// 3. 字段映射与类型转换
    /// 4. 清洗与 DQ 校验（未解析值的行丢弃、非法优先级剔除）
    async fn load_inputs(&self, paths: &InputPaths) -> ImportResult<LoadedInputs>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表（表头 + 行记录）
    ///
    /// # 参数
    /// - file_path: 文件路径
    /// - sheet: 工作表选择（CSV 忽略）
    fn parse_to_raw_table(&self, file_path: &Path, sheet: &SheetSelector)
        -> ImportResult<RawTable>;
}
