//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了数据访问层的错误类型和处理机制。

use thiserror::Error;

/// 数据访问层错误类型枚举
///
/// 定义了缓存、批量队列和远端调用中可能发生的各种错误类型
#[derive(Error, Debug)]
pub enum SyncError {
    /// 远端存储调用失败（网络错误或后端拒绝写入）
    #[error("Remote store error: {0}")]
    Remote(String),

    /// 序列化/反序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// 配置错误
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// 队列已达容量上限，拒绝新操作
    #[error("Mutation queue is full (capacity {0})")]
    QueueFull(usize),

    /// 队列已关闭，操作被丢弃
    #[error("Mutation queue is closed")]
    QueueClosed,

    /// 待重放记录解析失败
    #[error("Pending replay error: {0}")]
    ReplayError(String),

    /// 本地持久化存储操作失败
    #[error("Pending store error: {0}")]
    PendingStoreError(String),

    /// IO错误
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// 数据访问层操作结果类型别名
///
/// 简化错误处理，所有操作都返回此类型
pub type Result<T> = std::result::Result<T, SyncError>;
