//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了批量变更队列，用于平滑删除类操作的突发流量。
//!
//! 队列是进程内的FIFO，按有界轮次排空：每轮最多取走
//! `max_round_size` 个操作并发执行，全部落定后暂停
//! `round_pause_ms` 毫秒再开始下一轮。队列为空且无排空任务
//! 运行时处于 Idle 状态，`add` 触发 Idle → Draining 迁移；
//! 排空期间的 `add` 只是纯追加。无重试、无取消、无持久化：
//! 进程退出时未执行的操作即丢失。

use crate::config::BatchConfig;
use crate::error::{Result, SyncError};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{oneshot, Mutex};
use tracing::{debug, warn};

/// 入队的异步操作类型
type MutationFuture = Pin<Box<dyn Future<Output = Result<()>> + Send + 'static>>;

/// 队列中的待执行操作
///
/// 操作本体加上向调用方交付结果的单次通道
struct QueuedOp {
    op: MutationFuture,
    done: oneshot::Sender<Result<()>>,
}

/// 变更操作凭据
///
/// 调用方在入队时获得，等待它即可取得该操作自身的执行结果。
/// 操作在队列关闭时被丢弃的话，凭据以 `QueueClosed` 拒绝。
pub struct MutationTicket {
    rx: oneshot::Receiver<Result<()>>,
}

impl MutationTicket {
    /// 等待操作执行完成
    ///
    /// # 返回值
    ///
    /// 返回操作自身的执行结果；操作被丢弃时返回 `QueueClosed`
    pub async fn wait(self) -> Result<()> {
        match self.rx.await {
            Ok(result) => result,
            Err(_) => Err(SyncError::QueueClosed),
        }
    }
}

/// 队列统计计数
#[derive(Debug, Default)]
pub struct QueueStats {
    /// 已完成的轮次数
    pub rounds: AtomicU64,
    /// 已执行的操作数（含失败）
    pub executed: AtomicU64,
    /// 执行失败的操作数
    pub failed: AtomicU64,
}

/// 队列统计快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueStatsSnapshot {
    pub rounds: u64,
    pub executed: u64,
    pub failed: u64,
}

/// 队列内部状态
///
/// draining 标志与队列本体在同一把锁下，保证同一时刻
/// 最多只有一个排空任务在运行
struct QueueState {
    ops: VecDeque<QueuedOp>,
    draining: bool,
    closed: bool,
}

/// 批量变更队列
pub struct BatchMutationQueue {
    state: Arc<Mutex<QueueState>>,
    config: BatchConfig,
    stats: Arc<QueueStats>,
}

impl BatchMutationQueue {
    /// 创建新的批量变更队列
    ///
    /// # 参数
    ///
    /// * `config` - 批量队列配置
    pub fn new(config: BatchConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(QueueState {
                ops: VecDeque::new(),
                draining: false,
                closed: false,
            })),
            config,
            stats: Arc::new(QueueStats::default()),
        }
    }

    /// 创建带有默认配置的队列
    pub fn new_with_default_config() -> Self {
        Self::new(BatchConfig::default())
    }

    /// 将操作追加到队列尾部
    ///
    /// 队列处于 Idle 时启动排空任务；已在排空时仅追加。
    /// 队列已满时以 `QueueFull` 拒绝，已关闭时以 `QueueClosed` 拒绝。
    ///
    /// # 参数
    ///
    /// * `op` - 零参数异步操作
    ///
    /// # 返回值
    ///
    /// 返回操作凭据，等待它可取得该操作的执行结果
    pub async fn add<F>(&self, op: F) -> Result<MutationTicket>
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let mut state = self.state.lock().await;

        if state.closed {
            return Err(SyncError::QueueClosed);
        }
        if state.ops.len() >= self.config.max_queue_size {
            warn!("batch queue full: capacity={}", self.config.max_queue_size);
            return Err(SyncError::QueueFull(self.config.max_queue_size));
        }

        state.ops.push_back(QueuedOp {
            op: Box::pin(op),
            done: tx,
        });
        debug!("batch queue add: len={}", state.ops.len());

        if !state.draining {
            state.draining = true;
            let shared = self.state.clone();
            let config = self.config.clone();
            let stats = self.stats.clone();
            tokio::spawn(async move {
                Self::drain_loop(shared, config, stats).await;
            });
        }
        drop(state);

        Ok(MutationTicket { rx })
    }

    /// 排空循环
    ///
    /// 队列非空时从头部取走至多一轮的操作并发执行，
    /// 全部落定后暂停再取下一轮；队列为空时退回 Idle 并退出。
    /// 单个操作的失败只交付给它自己的凭据，不影响同轮的
    /// 其他操作，也不中断循环。
    async fn drain_loop(state: Arc<Mutex<QueueState>>, config: BatchConfig, stats: Arc<QueueStats>) {
        loop {
            let round: Vec<QueuedOp> = {
                let mut st = state.lock().await;
                if st.ops.is_empty() {
                    st.draining = false;
                    debug!("batch queue drained, back to idle");
                    return;
                }
                let n = st.ops.len().min(config.max_round_size);
                st.ops.drain(..n).collect()
            };

            let round_size = round.len();
            debug!("batch round start: size={}", round_size);

            futures::future::join_all(round.into_iter().map(|queued| {
                let stats = stats.clone();
                async move {
                    let QueuedOp { op, done } = queued;
                    let result = op.await;
                    stats.executed.fetch_add(1, Ordering::Relaxed);
                    if let Err(e) = &result {
                        stats.failed.fetch_add(1, Ordering::Relaxed);
                        warn!("batched operation failed: {}", e);
                    }
                    // 调用方可能已放弃凭据
                    let _ = done.send(result);
                }
            }))
            .await;

            stats.rounds.fetch_add(1, Ordering::Relaxed);
            debug!("batch round done: size={}", round_size);

            tokio::time::sleep(config.round_pause()).await;
        }
    }

    /// 关闭队列
    ///
    /// 丢弃所有尚未取走的操作并拒绝其凭据；已进入当前轮次的
    /// 操作不受影响，仍会执行到底。关闭后的 `add` 被拒绝。
    pub async fn close(&self) {
        let discarded: Vec<QueuedOp> = {
            let mut st = self.state.lock().await;
            st.closed = true;
            st.ops.drain(..).collect()
        };
        if !discarded.is_empty() {
            debug!("batch queue closed: discarded={}", discarded.len());
        }
        for queued in discarded {
            let _ = queued.done.send(Err(SyncError::QueueClosed));
        }
    }

    /// 尚未取走的操作数
    pub async fn len(&self) -> usize {
        self.state.lock().await.ops.len()
    }

    /// 队列是否处于 Idle 状态（空且无排空任务运行）
    pub async fn is_idle(&self) -> bool {
        let st = self.state.lock().await;
        st.ops.is_empty() && !st.draining
    }

    /// 获取统计快照
    pub fn stats(&self) -> QueueStatsSnapshot {
        QueueStatsSnapshot {
            rounds: self.stats.rounds.load(Ordering::Relaxed),
            executed: self.stats.executed.load(Ordering::Relaxed),
            failed: self.stats.failed.load(Ordering::Relaxed),
        }
    }
}
