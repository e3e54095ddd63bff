//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了数据访问门面，编排缓存、远端存储与批量队列。
//!
//! 读路径先查指纹缓存，未命中才发起远端调用并在成功后回填；
//! 写路径直接调用远端并使受影响的缓存条目失效；删除类操作
//! 不立即执行，而是进入批量变更队列，调用方通过凭据观察结果。

use crate::cache::{CacheStatsSnapshot, FingerprintCache};
use crate::config::SyncConfig;
use crate::error::{Result, SyncError};
use crate::key::{CacheKey, EntityClass, KeyPattern};
use crate::model::{Completion, Mission, MissionDraft, Profile};
use crate::queue::{BatchMutationQueue, MutationTicket, QueueStatsSnapshot};
use crate::store::RemoteStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// 数据访问门面
///
/// 显式构造的实例，持有缓存与队列的所有权；测试可以创建
/// 彼此隔离的多个实例。生命周期以 `new` 开始，以 `teardown`
/// 结束（清空缓存并关闭队列）。
pub struct DataClient {
    store: Arc<dyn RemoteStore>,
    cache: FingerprintCache,
    queue: BatchMutationQueue,
    config: SyncConfig,
}

impl DataClient {
    /// 创建新的数据访问门面
    ///
    /// # 参数
    ///
    /// * `store` - 远端实体存储
    /// * `config` - 数据访问层配置
    ///
    /// # 返回值
    ///
    /// 配置无效时返回 `ConfigError`
    pub fn new(store: Arc<dyn RemoteStore>, config: SyncConfig) -> Result<Self> {
        if let Err(e) = config.validate() {
            return Err(SyncError::ConfigError(e));
        }
        Ok(Self {
            store,
            cache: FingerprintCache::new(config.cache.default_ttl()),
            queue: BatchMutationQueue::new(config.batch.clone()),
            config,
        })
    }

    /// 读取用户资料（经缓存）
    ///
    /// 资料几乎不变，使用最长的TTL。不存在的资料不回填缓存。
    #[instrument(skip(self), level = "debug")]
    pub async fn profile(&self, user_id: &str) -> Result<Option<Profile>> {
        let key = CacheKey::profile(user_id);
        if let Some(profile) = self.cache.get_typed::<Profile>(&key) {
            return Ok(Some(profile));
        }
        let profile = self.store.fetch_profile(user_id).await?;
        if let Some(p) = &profile {
            self.cache.set_typed(key, p, self.config.cache.profile_ttl())?;
        }
        Ok(profile)
    }

    /// 读取用户的任务列表（经缓存）
    #[instrument(skip(self), level = "debug")]
    pub async fn missions(&self, user_id: &str) -> Result<Vec<Mission>> {
        let key = CacheKey::missions(user_id);
        if let Some(missions) = self.cache.get_typed::<Vec<Mission>>(&key) {
            return Ok(missions);
        }
        let missions = self.store.fetch_missions(user_id).await?;
        self.cache
            .set_typed(key, &missions, self.config.cache.missions_ttl())?;
        Ok(missions)
    }

    /// 读取用户某日的打卡记录（经缓存）
    ///
    /// 当日记录变化频繁，使用最短的TTL
    #[instrument(skip(self), level = "debug")]
    pub async fn completions(&self, user_id: &str, date: NaiveDate) -> Result<Vec<Completion>> {
        let key = CacheKey::completions(user_id, date);
        if let Some(completions) = self.cache.get_typed::<Vec<Completion>>(&key) {
            return Ok(completions);
        }
        let completions = self.store.fetch_completions(user_id, date).await?;
        self.cache
            .set_typed(key, &completions, self.config.cache.completions_ttl())?;
        Ok(completions)
    }

    /// 创建新任务
    ///
    /// 直接写远端，失败原样向调用方传播；成功后使该用户的
    /// 任务列表条目失效，下一次读取回源
    #[instrument(skip(self, draft), level = "debug")]
    pub async fn create_mission(&self, user_id: &str, draft: MissionDraft) -> Result<Mission> {
        let mission = draft.into_mission(user_id);
        self.store.insert_mission(&mission).await?;
        self.cache.delete(&CacheKey::missions(user_id));
        debug!("mission created: user={}, id={}", user_id, mission.id);
        Ok(mission)
    }

    /// 为任务打卡
    ///
    /// 同一任务同一天已有记录时幂等返回既有记录，不重复插入
    #[instrument(skip(self), level = "debug")]
    pub async fn complete_mission(
        &self,
        user_id: &str,
        mission_id: Uuid,
        date: NaiveDate,
    ) -> Result<Completion> {
        let existing = self.completions(user_id, date).await?;
        if let Some(found) = existing.into_iter().find(|c| c.mission_id == mission_id) {
            debug!(
                "mission already completed: user={}, mission={}, date={}",
                user_id, mission_id, date
            );
            return Ok(found);
        }

        let completion = Completion::new(user_id, mission_id, date);
        self.store.insert_completion(&completion).await?;
        self.cache.delete(&CacheKey::completions(user_id, date));
        debug!(
            "mission completed: user={}, mission={}, date={}",
            user_id, mission_id, date
        );
        Ok(completion)
    }

    /// 删除任务（删除类操作，进入批量队列）
    ///
    /// 立即使该用户的任务列表和全部打卡记录条目失效，
    /// 远端删除排队执行；调用方通过返回的凭据观察结果
    #[instrument(skip(self), level = "debug")]
    pub async fn delete_mission(&self, user_id: &str, mission_id: Uuid) -> Result<MutationTicket> {
        self.cache.delete(&CacheKey::missions(user_id));
        self.cache
            .invalidate_matching(&KeyPattern::class_owner(EntityClass::Completions, user_id));

        let store = self.store.clone();
        let user = user_id.to_string();
        self.queue
            .add(async move { store.delete_mission(&user, mission_id).await })
            .await
    }

    /// 取消打卡（删除类操作，进入批量队列）
    #[instrument(skip(self), level = "debug")]
    pub async fn uncomplete_mission(
        &self,
        user_id: &str,
        date: NaiveDate,
        completion_id: Uuid,
    ) -> Result<MutationTicket> {
        self.cache.delete(&CacheKey::completions(user_id, date));

        let store = self.store.clone();
        let user = user_id.to_string();
        self.queue
            .add(async move { store.delete_completion(&user, completion_id).await })
            .await
    }

    /// 重新加载任务列表
    ///
    /// 幂等：丢弃缓存条目后重新回源。由宿主应用注册为
    /// 远端变更通知的回调；订阅生命周期本身不在本层管理
    #[instrument(skip(self), level = "debug")]
    pub async fn reload_missions(&self, user_id: &str) -> Result<Vec<Mission>> {
        self.cache.delete(&CacheKey::missions(user_id));
        self.missions(user_id).await
    }

    /// 重新加载某日打卡记录
    #[instrument(skip(self), level = "debug")]
    pub async fn reload_completions(
        &self,
        user_id: &str,
        date: NaiveDate,
    ) -> Result<Vec<Completion>> {
        self.cache.delete(&CacheKey::completions(user_id, date));
        self.completions(user_id, date).await
    }

    /// 使某用户的全部缓存条目失效
    ///
    /// 用于切换账号或该用户数据的批量变更
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        self.cache.invalidate_matching(&KeyPattern::owner(user_id))
    }

    /// 清空全部缓存条目
    ///
    /// 内存压力信号下由宿主应用调用
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// 销毁实例
    ///
    /// 清空缓存并关闭队列，尚未执行的排队操作被丢弃、
    /// 其凭据以 `QueueClosed` 拒绝
    #[instrument(skip(self), level = "info")]
    pub async fn teardown(&self) {
        info!("tearing down data client");
        self.cache.clear();
        self.queue.close().await;
    }

    /// 缓存统计快照
    pub fn cache_stats(&self) -> CacheStatsSnapshot {
        self.cache.stats()
    }

    /// 队列统计快照
    pub fn queue_stats(&self) -> QueueStatsSnapshot {
        self.queue.stats()
    }

    /// 队列中尚未取走的操作数
    pub async fn queue_len(&self) -> usize {
        self.queue.len().await
    }

    /// 队列是否处于 Idle 状态
    pub async fn queue_is_idle(&self) -> bool {
        self.queue.is_idle().await
    }
}
