// ==========================================
// POSM 需求测算系统 - 分配规则快照
// ==========================================
// 职责: 从配置读取器一次性读取规则,引擎同步使用
// ==========================================

use crate::config::{config_keys, AllocationConfigReader};
use crate::domain::types::UnknownAddressPolicy;
use crate::engine::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

pub const DEFAULT_BUFFER_MULTIPLIER: f64 = 1.3;
pub const DEFAULT_BATCH_SIZE: u64 = 5;
pub const DEFAULT_UNKNOWN_ADDRESS_LABEL: &str = "Unknown address";

/// 一次运行使用的分配规则
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationRules {
    pub buffer_multiplier: f64,
    pub batch_size: u64,
    pub unknown_address: UnknownAddressPolicy,
}

impl Default for AllocationRules {
    fn default() -> Self {
        Self {
            buffer_multiplier: DEFAULT_BUFFER_MULTIPLIER,
            batch_size: DEFAULT_BATCH_SIZE,
            unknown_address: UnknownAddressPolicy::Sentinel(
                DEFAULT_UNKNOWN_ADDRESS_LABEL.to_string(),
            ),
        }
    }
}

impl AllocationRules {
    /// 从配置读取规则并校验
    pub async fn load<C>(config: &C) -> EngineResult<Self>
    where
        C: AllocationConfigReader + ?Sized,
    {
        let rules = Self {
            buffer_multiplier: config.get_buffer_multiplier().await?,
            batch_size: config.get_batch_size().await?,
            unknown_address: config.get_unknown_address_policy().await?,
        };
        rules.validate()?;
        Ok(rules)
    }

    /// 校验规则
    ///
    /// # 返回
    /// - Err(InvalidRule): 批量为 0,或缓冲系数非有限值 / 小于 1
    pub fn validate(&self) -> EngineResult<()> {
        if self.batch_size == 0 {
            return Err(EngineError::InvalidRule {
                key: config_keys::BATCH_SIZE.to_string(),
                message: "分配批量必须大于 0".to_string(),
            });
        }
        if !self.buffer_multiplier.is_finite() || self.buffer_multiplier < 1.0 {
            return Err(EngineError::InvalidRule {
                key: config_keys::BUFFER_MULTIPLIER.to_string(),
                message: format!("缓冲系数必须为 >= 1 的有限值: {}", self.buffer_multiplier),
            });
        }
        Ok(())
    }

    /// 无地址门店在地址汇总中的标签; Drop 策略返回 None
    pub fn unknown_address_label(&self) -> Option<&str> {
        match &self.unknown_address {
            UnknownAddressPolicy::Sentinel(label) => Some(label.as_str()),
            UnknownAddressPolicy::Drop => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        let rules = AllocationRules::default();
        assert!(rules.validate().is_ok());
        assert_eq!(rules.unknown_address_label(), Some("Unknown address"));
    }

    #[test]
    fn test_validate_rejects_zero_batch() {
        let rules = AllocationRules {
            batch_size: 0,
            ..AllocationRules::default()
        };
        assert!(matches!(
            rules.validate(),
            Err(EngineError::InvalidRule { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_bad_multiplier() {
        for multiplier in [0.9, f64::NAN, f64::INFINITY] {
            let rules = AllocationRules {
                buffer_multiplier: multiplier,
                ..AllocationRules::default()
            };
            assert!(rules.validate().is_err(), "multiplier {}", multiplier);
        }
    }

    #[test]
    fn test_drop_policy_has_no_label() {
        let rules = AllocationRules {
            unknown_address: UnknownAddressPolicy::Drop,
            ..AllocationRules::default()
        };
        assert_eq!(rules.unknown_address_label(), None);
    }
}
