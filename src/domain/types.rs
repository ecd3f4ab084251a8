// ==========================================
// POSM 需求测算系统 - 领域类型定义
// ==========================================
// 红线: 优先级与品类分组均为封闭枚举,不接受隐式数值比较
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 机型优先级 (Priority)
// ==========================================
// 源数据以 "1"/"2" 编码; 第三种取值一律拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    Critical, // 1 - 关键机型,需要缓冲
    Standard, // 2 - 普通机型
}

impl Priority {
    /// 源数据编码
    pub fn code(&self) -> u8 {
        match self {
            Priority::Critical => 1,
            Priority::Standard => 2,
        }
    }

    /// 是否需要施加需求缓冲
    pub fn is_buffered(&self) -> bool {
        matches!(self, Priority::Critical)
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// 优先级解析失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPriority(pub String);

impl fmt::Display for InvalidPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "优先级取值非法: {}（仅允许 1 或 2）", self.0)
    }
}

impl std::error::Error for InvalidPriority {}

impl FromStr for Priority {
    type Err = InvalidPriority;

    /// 接受 "1" / "2" 以及 Excel 数值单元格导出的 "1.0" / "2.0"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed {
            "1" => return Ok(Priority::Critical),
            "2" => return Ok(Priority::Standard),
            _ => {}
        }

        match trimmed.parse::<f64>() {
            Ok(v) if v == 1.0 => Ok(Priority::Critical),
            Ok(v) if v == 2.0 => Ok(Priority::Standard),
            _ => Err(InvalidPriority(trimmed.to_string())),
        }
    }
}

// ==========================================
// 品类分组 (Category Group)
// ==========================================
// Care = 滚筒洗衣机 + 干衣机; SDA = 其余全部品类
// 单一枚举字段保证两组互斥且完备
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CategoryGroup {
    Care,
    #[serde(rename = "SDA")]
    Sda,
}

impl CategoryGroup {
    /// 显式分组标签解析（大小写不敏感）
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_uppercase().as_str() {
            "CARE" => Some(CategoryGroup::Care),
            "SDA" => Some(CategoryGroup::Sda),
            _ => None,
        }
    }

    /// 按品类名称归组: 命中 Care 品类列表则为 Care,否则为 SDA
    pub fn classify(category: &str, care_categories: &[String]) -> Self {
        let normalized = category.trim().to_uppercase();
        if care_categories
            .iter()
            .any(|c| c.trim().to_uppercase() == normalized)
        {
            CategoryGroup::Care
        } else {
            CategoryGroup::Sda
        }
    }
}

impl fmt::Display for CategoryGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryGroup::Care => write!(f, "Care"),
            CategoryGroup::Sda => write!(f, "SDA"),
        }
    }
}

// ==========================================
// 无地址门店策略 (Unknown Address Policy)
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnknownAddressPolicy {
    Sentinel(String), // 归入哨兵桶
    Drop,             // 不进入地址汇总
}

impl fmt::Display for UnknownAddressPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnknownAddressPolicy::Sentinel(label) => write!(f, "SENTINEL({})", label),
            UnknownAddressPolicy::Drop => write!(f, "DROP"),
        }
    }
}
