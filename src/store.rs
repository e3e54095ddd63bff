//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了外部协作方的接口。
//!
//! 远端存储是数据的唯一权威来源，本层只通过行级CRUD访问它，
//! 不管理表结构与访问策略。本地持久化存储仅用于断线重连后
//! 待重放记录的读取与清除。

use crate::error::Result;
use crate::model::{Completion, Mission, Profile};
use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

/// 远端实体存储接口
///
/// 暴露三类实体集合的行级CRUD：用户资料（每用户一条）、
/// 周期性任务（归属某用户）、打卡记录（用户×任务×日期，
/// 每用户每任务每天最多一条）
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// 读取用户资料
    async fn fetch_profile(&self, user_id: &str) -> Result<Option<Profile>>;

    /// 读取用户的全部任务
    async fn fetch_missions(&self, user_id: &str) -> Result<Vec<Mission>>;

    /// 插入新任务
    async fn insert_mission(&self, mission: &Mission) -> Result<()>;

    /// 删除任务
    async fn delete_mission(&self, user_id: &str, mission_id: Uuid) -> Result<()>;

    /// 读取用户某日的打卡记录
    async fn fetch_completions(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Completion>>;

    /// 插入打卡记录
    async fn insert_completion(&self, completion: &Completion) -> Result<()>;

    /// 删除打卡记录
    async fn delete_completion(&self, user_id: &str, completion_id: Uuid) -> Result<()>;
}

/// 本地持久化键值存储接口
///
/// 字符串键到字符串值的持久化存储，用于断线期间积累的
/// 待重放操作记录
#[async_trait]
pub trait PendingStore: Send + Sync {
    /// 读取指定键的值
    async fn load(&self, key: &str) -> Result<Option<String>>;

    /// 清除指定键
    async fn clear(&self, key: &str) -> Result<()>;
}
