// ==========================================
// POSM 需求测算系统 - 分配配置读取 Trait
// ==========================================
// 职责: 定义加载器与引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::types::UnknownAddressPolicy;
use async_trait::async_trait;
use std::sync::Arc;

// ==========================================
// AllocationConfigReader Trait
// ==========================================
// 用途: 报表运行所需的配置读取接口
// 实现者: ConfigManager（JSON 配置文件 / 内置默认值）
#[async_trait]
pub trait AllocationConfigReader: Send + Sync {
    // ===== 分配规则 =====

    /// 获取优先级 1 机型的需求缓冲系数
    ///
    /// # 默认值
    /// - 1.3（即 +30%）
    async fn get_buffer_multiplier(&self) -> ConfigResult<f64>;

    /// 获取分配批量（向上取整的倍数）
    ///
    /// # 默认值
    /// - 5
    async fn get_batch_size(&self) -> ConfigResult<u64>;

    // ===== 报表口径 =====

    /// 获取无地址门店在地址汇总中的处理策略
    ///
    /// # 返回
    /// - UnknownAddressPolicy::Sentinel(label): 归入哨兵桶
    /// - UnknownAddressPolicy::Drop: 不计入地址汇总
    ///
    /// # 默认值
    /// - SENTINEL,标签 "Unknown address"
    async fn get_unknown_address_policy(&self) -> ConfigResult<UnknownAddressPolicy>;

    /// 获取报表语言
    ///
    /// # 默认值
    /// - "zh-CN"
    async fn get_report_locale(&self) -> ConfigResult<String>;

    // ===== 目录口径 =====

    /// 获取归入 Care 组的品类名称列表（滚筒洗衣机、干衣机）
    ///
    /// # 用途
    /// - 机型表没有显式 Care/SDA 分组列时,按 category 列归组
    async fn get_care_categories(&self) -> ConfigResult<Vec<String>>;
}

// 共享读取器（批量运行时多个请求共用同一配置）
#[async_trait]
impl<T> AllocationConfigReader for Arc<T>
where
    T: AllocationConfigReader + ?Sized,
{
    async fn get_buffer_multiplier(&self) -> ConfigResult<f64> {
        (**self).get_buffer_multiplier().await
    }

    async fn get_batch_size(&self) -> ConfigResult<u64> {
        (**self).get_batch_size().await
    }

    async fn get_unknown_address_policy(&self) -> ConfigResult<UnknownAddressPolicy> {
        (**self).get_unknown_address_policy().await
    }

    async fn get_report_locale(&self) -> ConfigResult<String> {
        (**self).get_report_locale().await
    }

    async fn get_care_categories(&self) -> ConfigResult<Vec<String>> {
        (**self).get_care_categories().await
    }
}
