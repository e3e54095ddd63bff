//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了习惯打卡应用的领域数据类型。

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 任务类别枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// 身体
    Physical,
    /// 情绪
    Emotional,
    /// 社交
    Social,
    /// 心灵
    Spiritual,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Physical => "physical",
            Category::Emotional => "emotional",
            Category::Social => "social",
            Category::Spiritual => "spiritual",
        };
        write!(f, "{}", s)
    }
}

/// 任务频率枚举
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    /// 每日
    Daily,
    /// 每周
    Weekly,
    /// 每月
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        write!(f, "{}", s)
    }
}

/// 任务（用户定义的周期性习惯）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mission {
    /// 任务ID
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: String,
    /// 任务名称
    pub name: String,
    /// 任务图标
    pub emblem: String,
    /// 任务类别
    pub category: Category,
    /// 任务频率
    pub frequency: Frequency,
    /// 创建时间
    pub created_at: DateTime<Utc>,
}

/// 任务草稿
///
/// 创建任务时由调用方提供的字段，ID和时间戳由创建路径补全
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissionDraft {
    /// 任务名称
    pub name: String,
    /// 任务图标
    pub emblem: String,
    /// 任务类别
    pub category: Category,
    /// 任务频率
    pub frequency: Frequency,
}

impl MissionDraft {
    /// 将草稿补全为完整任务
    ///
    /// # 参数
    ///
    /// * `user_id` - 所属用户ID
    pub fn into_mission(self, user_id: &str) -> Mission {
        Mission {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            name: self.name,
            emblem: self.emblem,
            category: self.category,
            frequency: self.frequency,
            created_at: Utc::now(),
        }
    }
}

/// 打卡记录
///
/// 记录某任务在某天被完成，同一用户同一任务每天最多一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    /// 记录ID
    pub id: Uuid,
    /// 所属用户ID
    pub user_id: String,
    /// 对应任务ID
    pub mission_id: Uuid,
    /// 打卡日期
    pub completed_on: NaiveDate,
    /// 打卡时间戳
    pub completed_at: DateTime<Utc>,
}

impl Completion {
    /// 创建新的打卡记录
    pub fn new(user_id: &str, mission_id: Uuid, completed_on: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            mission_id,
            completed_on,
            completed_at: Utc::now(),
        }
    }
}

/// 用户资料
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// 用户ID
    pub user_id: String,
    /// 显示名称
    pub display_name: String,
    /// 注册时间
    pub joined_at: DateTime<Utc>,
}
