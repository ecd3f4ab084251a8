// ==========================================
// POSM 需求测算系统 - 核心库
// ==========================================
// 用途: 按门店陈列测算 POSM 物料需求量与采购成本
// 流程: 输入加载 → 关联 → 需求计算 → 计价 → 五视图汇总 → 导出
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 输入表、分配明细与报表视图
pub mod domain;

// 配置层 - 分配规则与报表口径
pub mod config;

// 导入层 - Excel / CSV 输入
pub mod importer;

// 引擎层 - 测算规则
pub mod engine;

// API 层 - 报表生成
pub mod api;

// 导出层 - CSV / JSON 报表
pub mod export;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CategoryGroup, Priority, UnknownAddressPolicy};

// 领域实体
pub use domain::{
    AllocationLine, AllocationReport, DisplayObservation, DqReport, InputTables, Model, PosmLink,
    PriceEntry, PricedLine, ReportViews, RunDiagnostics, Store,
};

// 配置
pub use config::{AllocationConfigReader, ConfigManager};

// 导入
pub use importer::{InputLoader, InputLoaderImpl, InputPaths, LoadedInputs};

// 引擎
pub use engine::{allocate_quantity, AllocationPipeline, AllocationRules};

// API
pub use api::{ApiError, ApiResult, ReportApi};

// 导出
pub use export::ReportWriter;

// ==========================================
// 版本信息
// ==========================================
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "POSM 需求测算与成本报表";
