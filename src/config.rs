//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了数据访问层的配置结构和解析逻辑。

use serde::Deserialize;
use std::time::Duration;

pub const CONFIG_VERSION: u32 = 1;

/// 数据访问层总配置
///
/// 包含指纹缓存和批量变更队列的全部配置项
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct SyncConfig {
    /// 配置版本号
    pub config_version: Option<u32>,
    /// 指纹缓存配置
    pub cache: CacheConfig,
    /// 批量变更队列配置
    pub batch: BatchConfig,
}

/// 指纹缓存配置
///
/// TTL按实体类别非对称设置：变化频繁的数据（当日打卡记录）
/// 过期快，基本不变的数据（用户资料、任务列表）过期慢
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct CacheConfig {
    /// 用户资料条目的TTL（秒）
    pub profile_ttl_secs: u64,
    /// 任务列表条目的TTL（秒）
    pub missions_ttl_secs: u64,
    /// 打卡记录条目的TTL（秒）
    pub completions_ttl_secs: u64,
    /// 未指定类别时的默认TTL（秒）
    pub default_ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            profile_ttl_secs: 300,
            missions_ttl_secs: 120,
            completions_ttl_secs: 30,
            default_ttl_secs: 60,
        }
    }
}

impl CacheConfig {
    /// 用户资料TTL
    pub fn profile_ttl(&self) -> Duration {
        Duration::from_secs(self.profile_ttl_secs)
    }

    /// 任务列表TTL
    pub fn missions_ttl(&self) -> Duration {
        Duration::from_secs(self.missions_ttl_secs)
    }

    /// 打卡记录TTL
    pub fn completions_ttl(&self) -> Duration {
        Duration::from_secs(self.completions_ttl_secs)
    }

    /// 默认TTL
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs)
    }
}

/// 批量变更队列配置
#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct BatchConfig {
    /// 单轮最大操作数
    pub max_round_size: usize,
    /// 轮间暂停时间（毫秒）
    pub round_pause_ms: u64,
    /// 队列最大容量（防止内存无限增长）
    pub max_queue_size: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_round_size: 10,
            round_pause_ms: 25,
            max_queue_size: 1000,
        }
    }
}

impl BatchConfig {
    /// 轮间暂停时长
    pub fn round_pause(&self) -> Duration {
        Duration::from_millis(self.round_pause_ms)
    }
}

impl SyncConfig {
    /// 从TOML字符串解析配置
    ///
    /// # 参数
    ///
    /// * `content` - TOML格式的配置内容
    ///
    /// # 返回值
    ///
    /// 返回解析后的配置，解析失败时返回错误信息
    pub fn from_toml_str(content: &str) -> Result<Self, String> {
        let config: SyncConfig =
            toml::from_str(content).map_err(|e| format!("Failed to parse config: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// 验证配置
    ///
    /// 检查配置的有效性，确保所有值都在合理范围内
    pub fn validate(&self) -> Result<(), String> {
        // 验证配置版本
        if let Some(version) = &self.config_version {
            if *version > CONFIG_VERSION {
                return Err(format!(
                    "Configuration version {} is not supported. Current version is {}.",
                    version, CONFIG_VERSION
                ));
            }
        }

        // 验证TTL配置
        for (name, ttl) in [
            ("profile_ttl_secs", self.cache.profile_ttl_secs),
            ("missions_ttl_secs", self.cache.missions_ttl_secs),
            ("completions_ttl_secs", self.cache.completions_ttl_secs),
            ("default_ttl_secs", self.cache.default_ttl_secs),
        ] {
            if ttl == 0 {
                return Err(format!("Cache {} cannot be zero", name));
            }
            if ttl > 86400 {
                return Err(format!("Cache {} cannot exceed 1 day (86400 seconds)", name));
            }
        }

        // 验证批量队列配置
        if self.batch.max_round_size == 0 {
            return Err("Batch max_round_size cannot be zero".to_string());
        }

        if self.batch.max_round_size > 100 {
            return Err("Batch max_round_size cannot exceed 100".to_string());
        }

        if self.batch.round_pause_ms > 10_000 {
            return Err("Batch round_pause_ms cannot exceed 10000 ms".to_string());
        }

        if self.batch.max_queue_size < self.batch.max_round_size {
            return Err(format!(
                "Batch max_queue_size ({}) must be >= max_round_size ({})",
                self.batch.max_queue_size, self.batch.max_round_size
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(SyncConfig::default().validate().is_ok());
    }

    #[test]
    fn completions_ttl_is_shortest_by_default() {
        let cache = CacheConfig::default();
        assert!(cache.completions_ttl() < cache.missions_ttl());
        assert!(cache.missions_ttl() < cache.profile_ttl());
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = SyncConfig::from_toml_str(
            r#"
            config_version = 1

            [cache]
            completions_ttl_secs = 15

            [batch]
            max_round_size = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.cache.completions_ttl_secs, 15);
        assert_eq!(config.cache.missions_ttl_secs, 120);
        assert_eq!(config.batch.max_round_size, 5);
        assert_eq!(config.batch.round_pause_ms, 25);
    }

    #[test]
    fn rejects_zero_ttl() {
        let mut config = SyncConfig::default();
        config.cache.completions_ttl_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let mut config = SyncConfig::default();
        config.config_version = Some(CONFIG_VERSION + 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_queue_smaller_than_round() {
        let mut config = SyncConfig::default();
        config.batch.max_queue_size = 5;
        config.batch.max_round_size = 10;
        assert!(config.validate().is_err());
    }
}
