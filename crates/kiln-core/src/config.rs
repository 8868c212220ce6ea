//! 缓冲尺寸策略的部署期配置。
//!
//! 尺寸表是调优参数而非正确性要求，因此允许按部署注入；未提供时回落到
//! [`DEFAULT_BUFFER_SIZES`](crate::buffer::DEFAULT_BUFFER_SIZES)。
//!
//! ```toml
//! sizes = [1024, 4096, 16384, 65536]
//! initial_index = 1
//! ```

use std::sync::Arc;

use serde::Deserialize;
use thiserror::Error;

use crate::{
    buffer::{AdaptiveBufferSizer, BufferSizeTable, BufferTableError, DEFAULT_BUFFER_SIZES},
    error::{CoreError, ErrorCategory, codes},
};

/// 配置解析或校验失败。
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid buffer size table: {0}")]
    Table(#[from] BufferTableError),
    #[cfg(feature = "config-toml")]
    #[error("malformed toml: {0}")]
    Toml(#[from] toml::de::Error),
}

impl From<ConfigError> for CoreError {
    fn from(value: ConfigError) -> Self {
        CoreError::new(codes::CONFIG_INVALID, value.to_string())
            .with_category(ErrorCategory::InvalidArgument)
            .with_cause(value)
    }
}

/// 自适应缓冲策略的配置项。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AdaptiveBufferConfig {
    /// 候选尺寸（字节），需严格递增且至少两项。
    pub sizes: Vec<usize>,
    /// 新连接的起始索引，越界时钳制到表尾。
    pub initial_index: usize,
}

impl Default for AdaptiveBufferConfig {
    fn default() -> Self {
        Self {
            sizes: DEFAULT_BUFFER_SIZES.to_vec(),
            initial_index: 0,
        }
    }
}

impl AdaptiveBufferConfig {
    /// 从 TOML 文本解析配置并立即校验尺寸表。
    #[cfg(feature = "config-toml")]
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.build_table()?;
        Ok(config)
    }

    /// 校验并构造共享尺寸表。
    pub fn build_table(&self) -> Result<Arc<BufferSizeTable>, ConfigError> {
        Ok(Arc::new(BufferSizeTable::new(self.sizes.clone())?))
    }

    /// 按配置的起始索引为新连接构造尺寸策略。
    pub fn new_sizer(&self, table: Arc<BufferSizeTable>) -> AdaptiveBufferSizer {
        AdaptiveBufferSizer::with_initial_index(table, self.initial_index)
    }
}
