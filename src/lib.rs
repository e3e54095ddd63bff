//! habitsync - 习惯打卡应用的客户端数据访问层
//!
//! 提供指纹缓存（带TTL的读加速）与批量变更队列（删除类操作
//! 的有界轮次排空），在远端存储之上编排读穿、写失效与
//! 排队删除，并支持重连后的待重放操作处理。

#![doc(html_root_url = "https://docs.rs/habitsync/0.1.0")]

pub use serde;
pub use serde::{Deserialize, Serialize};
pub use serde_json;
pub use tokio;

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod key;
pub mod model;
pub mod queue;
pub mod replay;
pub mod store;

// Re-export commonly used items
pub use cache::{CacheStatsSnapshot, FingerprintCache};
pub use client::DataClient;
pub use config::{BatchConfig, CacheConfig, SyncConfig};
pub use error::{Result, SyncError};
pub use key::{CacheKey, EntityClass, KeyPattern};
pub use model::{Category, Completion, Frequency, Mission, MissionDraft, Profile};
pub use queue::{BatchMutationQueue, MutationTicket, QueueStatsSnapshot};
pub use replay::{replay_pending, PENDING_KEY};
pub use store::{PendingStore, RemoteStore};

/// habitsync 版本号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
