// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use posm_allocation::config::{AllocationConfigReader, ConfigError, ConfigResult};
use posm_allocation::domain::types::UnknownAddressPolicy;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub buffer_multiplier: f64,
    pub batch_size: u64,
    pub unknown_address: UnknownAddressPolicy,
    pub locale: String,
    pub care_categories: Vec<String>,
    /// 为 true 时所有读取均失败
    pub broken: bool,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            buffer_multiplier: 1.3,
            batch_size: 5,
            unknown_address: UnknownAddressPolicy::Sentinel("Unknown address".to_string()),
            locale: "en".to_string(),
            care_categories: vec!["FL WASHER".to_string(), "DRYER".to_string()],
            broken: false,
        }
    }
}

impl MockConfig {
    pub fn drop_unknown_address() -> Self {
        Self {
            unknown_address: UnknownAddressPolicy::Drop,
            ..Self::default()
        }
    }

    pub fn with_batch(batch_size: u64) -> Self {
        Self {
            batch_size,
            ..Self::default()
        }
    }

    fn check(&self, key: &str) -> ConfigResult<()> {
        if self.broken {
            return Err(ConfigError::ConfigReadError {
                key: key.to_string(),
                message: "mock broken".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl AllocationConfigReader for MockConfig {
    async fn get_buffer_multiplier(&self) -> ConfigResult<f64> {
        self.check("allocation.buffer_multiplier")?;
        Ok(self.buffer_multiplier)
    }

    async fn get_batch_size(&self) -> ConfigResult<u64> {
        self.check("allocation.batch_size")?;
        Ok(self.batch_size)
    }

    async fn get_unknown_address_policy(&self) -> ConfigResult<UnknownAddressPolicy> {
        self.check("report.unknown_address_policy")?;
        Ok(self.unknown_address.clone())
    }

    async fn get_report_locale(&self) -> ConfigResult<String> {
        self.check("report.locale")?;
        Ok(self.locale.clone())
    }

    async fn get_care_categories(&self) -> ConfigResult<Vec<String>> {
        self.check("catalog.care_categories")?;
        Ok(self.care_categories.clone())
    }
}
