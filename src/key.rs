//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了结构化缓存键及其模式匹配。
//!
//! 键是 (实体类别, 所属用户, 可选子键) 三元组，而非拼接字符串。
//! 失效匹配按字段逐一比较，避免了子串匹配下
//! 某个ID恰好是其他键片段子串时的误失效。

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// 缓存实体类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityClass {
    /// 用户资料
    Profile,
    /// 任务列表
    Missions,
    /// 打卡记录
    Completions,
}

impl std::fmt::Display for EntityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityClass::Profile => "profile",
            EntityClass::Missions => "missions",
            EntityClass::Completions => "completions",
        };
        write!(f, "{}", s)
    }
}

/// 结构化缓存键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    /// 实体类别
    pub class: EntityClass,
    /// 所属用户ID
    pub owner: String,
    /// 可选子键（如打卡记录的日期）
    pub subkey: Option<String>,
}

impl CacheKey {
    /// 构造用户资料键
    pub fn profile(owner: &str) -> Self {
        Self {
            class: EntityClass::Profile,
            owner: owner.to_string(),
            subkey: None,
        }
    }

    /// 构造任务列表键
    pub fn missions(owner: &str) -> Self {
        Self {
            class: EntityClass::Missions,
            owner: owner.to_string(),
            subkey: None,
        }
    }

    /// 构造某日打卡记录键
    pub fn completions(owner: &str, date: NaiveDate) -> Self {
        Self {
            class: EntityClass::Completions,
            owner: owner.to_string(),
            subkey: Some(date.format("%Y-%m-%d").to_string()),
        }
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.subkey {
            Some(sub) => write!(f, "{}:{}:{}", self.class, self.owner, sub),
            None => write!(f, "{}:{}", self.class, self.owner),
        }
    }
}

/// 缓存键匹配模式
///
/// 每个字段为 `Some` 时要求精确相等，为 `None` 时作为通配符。
/// 一次失效调用即可覆盖某用户的全部条目或某类实体的全部条目。
#[derive(Debug, Clone, Default)]
pub struct KeyPattern {
    /// 实体类别过滤
    pub class: Option<EntityClass>,
    /// 所属用户过滤
    pub owner: Option<String>,
    /// 子键过滤
    pub subkey: Option<String>,
}

impl KeyPattern {
    /// 匹配指定用户的全部条目
    pub fn owner(owner: &str) -> Self {
        Self {
            owner: Some(owner.to_string()),
            ..Default::default()
        }
    }

    /// 匹配指定类别的全部条目
    pub fn class(class: EntityClass) -> Self {
        Self {
            class: Some(class),
            ..Default::default()
        }
    }

    /// 匹配指定用户在指定类别下的全部条目
    pub fn class_owner(class: EntityClass, owner: &str) -> Self {
        Self {
            class: Some(class),
            owner: Some(owner.to_string()),
            subkey: None,
        }
    }

    /// 判断键是否匹配此模式
    pub fn matches(&self, key: &CacheKey) -> bool {
        if let Some(class) = self.class {
            if key.class != class {
                return false;
            }
        }
        if let Some(owner) = &self.owner {
            if &key.owner != owner {
                return false;
            }
        }
        if let Some(subkey) = &self.subkey {
            if key.subkey.as_ref() != Some(subkey) {
                return false;
            }
        }
        true
    }
}
