// ==========================================
// POSM 需求测算系统 - 引擎层
// ==========================================
// 职责: 关联 → 需求计算 → 计价 → 汇总
// 红线: 引擎单线程、同步、无 I/O; 结构性错误先于任何阶段抛出
// ==========================================

pub mod aggregator;
pub mod error;
pub mod join;
pub mod orchestrator;
pub mod precondition;
pub mod pricing;
pub mod requirement;
pub mod rules;

// 重导出核心引擎
pub use aggregator::Aggregator;
pub use error::{EngineError, EngineResult};
pub use join::{JoinEngine, JoinOutcome, JoinStats};
pub use orchestrator::{AllocationPipeline, PipelineOutput};
pub use precondition::check_preconditions;
pub use pricing::{PriceBook, PricingApplier, PricingStats};
pub use requirement::{allocate_quantity, RequirementCalculator};
pub use rules::AllocationRules;
