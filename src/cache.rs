//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了指纹缓存，基于内存的读加速缓存。
//!
//! 缓存仅在本进程内生效，从不访问网络；所有填充都发生在
//! 远端读写成功之后的调用点。条目过期采用惰性删除：
//! 没有后台清理线程，过期条目在下一次读取时被当场移除。

use crate::error::Result;
use crate::key::{CacheKey, KeyPattern};
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

/// 缓存条目
///
/// 值以JSON字节形式保存，过期判定基于插入时刻与TTL
struct CacheEntry {
    /// 序列化后的值
    value: Vec<u8>,
    /// 插入时刻
    stored_at: Instant,
    /// 过期时长
    ttl: Duration,
}

impl CacheEntry {
    /// 条目是否已过期
    fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.stored_at) > self.ttl
    }
}

/// 缓存统计计数
#[derive(Debug, Default)]
pub struct CacheStats {
    /// 命中次数
    pub hits: AtomicU64,
    /// 未命中次数
    pub misses: AtomicU64,
    /// 惰性过期移除次数
    pub expirations: AtomicU64,
    /// 显式失效移除条数
    pub invalidations: AtomicU64,
}

/// 缓存统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub expirations: u64,
    pub invalidations: u64,
}

/// 指纹缓存
///
/// 将结构化键映射到带TTL的值字节，用于避免重复的远端读取。
/// 缓存是建议性的：调用方在同步的缓存检查与其后的异步远端
/// 调用之间可以任意交错，最坏情况是一次多余的远端往返或
/// 一次被TTL限定的过期读取。
pub struct FingerprintCache {
    entries: DashMap<CacheKey, CacheEntry>,
    default_ttl: Duration,
    stats: CacheStats,
}

impl FingerprintCache {
    /// 创建新的指纹缓存
    ///
    /// # 参数
    ///
    /// * `default_ttl` - 未显式指定TTL时使用的默认过期时长
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            default_ttl,
            stats: CacheStats::default(),
        }
    }

    /// 插入或覆盖条目，重置其计时
    ///
    /// # 参数
    ///
    /// * `key` - 缓存键
    /// * `value` - 序列化后的值字节
    /// * `ttl` - 过期时长
    pub fn set(&self, key: CacheKey, value: Vec<u8>, ttl: Duration) {
        debug!("cache set: key={}, value_len={}, ttl={:?}", key, value.len(), ttl);
        self.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
                ttl,
            },
        );
    }

    /// 以默认TTL插入条目
    pub fn set_default(&self, key: CacheKey, value: Vec<u8>) {
        self.set(key, value, self.default_ttl);
    }

    /// 获取缓存值
    ///
    /// 条目存在且未过期时返回其值；已过期的条目作为副作用
    /// 被当场移除并按未命中处理。从不阻塞，从不访问远端。
    pub fn get(&self, key: &CacheKey) -> Option<Vec<u8>> {
        let now = Instant::now();
        // 分片引用必须先释放，之后才能安全地移除过期条目
        let live = match self.entries.get(key) {
            Some(entry) if !entry.is_expired(now) => Some(entry.value.clone()),
            Some(_) => None,
            None => {
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache get: key={}, hit=false", key);
                return None;
            }
        };

        match live {
            Some(value) => {
                self.stats.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache get: key={}, hit=true", key);
                Some(value)
            }
            None => {
                // 惰性过期：读到过期条目时当场移除
                self.entries.remove(key);
                self.stats.expirations.fetch_add(1, Ordering::Relaxed);
                self.stats.misses.fetch_add(1, Ordering::Relaxed);
                debug!("cache get: key={}, expired=true, removed", key);
                None
            }
        }
    }

    /// 删除条目，不存在时为空操作
    pub fn delete(&self, key: &CacheKey) {
        if self.entries.remove(key).is_some() {
            debug!("cache delete: key={}", key);
        }
    }

    /// 无条件清空全部条目
    ///
    /// 用于内存压力信号以及登出/销毁时的清理
    pub fn clear(&self) {
        let count = self.entries.len();
        self.entries.clear();
        debug!("cache clear: removed={}", count);
    }

    /// 按模式失效条目
    ///
    /// 移除所有匹配模式的条目，不匹配的条目不受影响
    ///
    /// # 参数
    ///
    /// * `pattern` - 键匹配模式
    ///
    /// # 返回值
    ///
    /// 返回被移除的条目数
    pub fn invalidate_matching(&self, pattern: &KeyPattern) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !pattern.matches(key));
        let removed = before - self.entries.len();
        self.stats
            .invalidations
            .fetch_add(removed as u64, Ordering::Relaxed);
        debug!("cache invalidate: pattern={:?}, removed={}", pattern, removed);
        removed
    }

    /// 以类型化方式读取条目
    ///
    /// 反序列化失败的条目视为未命中并被移除
    pub fn get_typed<T: DeserializeOwned>(&self, key: &CacheKey) -> Option<T> {
        let bytes = self.get(key)?;
        match serde_json::from_slice(&bytes) {
            Ok(value) => Some(value),
            Err(e) => {
                debug!("cache get_typed: key={}, decode failed: {}", key, e);
                self.delete(key);
                None
            }
        }
    }

    /// 以类型化方式写入条目
    pub fn set_typed<T: Serialize>(&self, key: CacheKey, value: &T, ttl: Duration) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, bytes, ttl);
        Ok(())
    }

    /// 当前条目数（含未被惰性移除的过期条目）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 获取统计快照
    pub fn stats(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.stats.hits.load(Ordering::Relaxed),
            misses: self.stats.misses.load(Ordering::Relaxed),
            expirations: self.stats.expirations.load(Ordering::Relaxed),
            invalidations: self.stats.invalidations.load(Ordering::Relaxed),
        }
    }
}
