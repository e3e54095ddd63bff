//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了断线重连后的待重放操作处理。
//!
//! 断线期间宿主应用把用户操作以 `{operation_type, payload}`
//! 记录的JSON列表写入本地持久化存储；重连后本模块读取该列表，
//! 逐条分发到对应的变更入口，全部尝试完毕后无条件清除记录。
//! 顶层JSON解析失败时整个列表被丢弃而非部分重试。

use crate::client::DataClient;
use crate::error::{Result, SyncError};
use crate::model::MissionDraft;
use crate::store::PendingStore;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// 待重放记录在本地存储中的键
pub const PENDING_KEY: &str = "habitsync:pending";

/// 待重放操作记录
#[derive(Debug, Deserialize)]
pub struct PendingRecord {
    /// 操作类型
    pub operation_type: String,
    /// 操作载荷
    pub payload: serde_json::Value,
}

/// 创建任务的重放载荷
#[derive(Debug, Deserialize)]
struct CreateMissionPayload {
    user_id: String,
    #[serde(flatten)]
    draft: MissionDraft,
}

/// 打卡的重放载荷
#[derive(Debug, Deserialize)]
struct CompleteMissionPayload {
    user_id: String,
    mission_id: Uuid,
    date: NaiveDate,
}

/// 删除任务的重放载荷
#[derive(Debug, Deserialize)]
struct DeleteMissionPayload {
    user_id: String,
    mission_id: Uuid,
}

/// 重放待处理操作
///
/// 读取本地存储中的待重放列表并逐条分发。单条记录的载荷错误
/// 或执行失败只记录日志并跳过，不影响其余记录；全部尝试完毕后
/// 无条件清除该键。
///
/// # 参数
///
/// * `client` - 数据访问门面
/// * `pending` - 本地持久化存储
///
/// # 返回值
///
/// 返回成功重放的记录数
#[instrument(skip(client, pending), level = "info")]
pub async fn replay_pending(client: &DataClient, pending: &dyn PendingStore) -> Result<usize> {
    let raw = match pending.load(PENDING_KEY).await? {
        Some(raw) => raw,
        None => {
            debug!("no pending operations to replay");
            return Ok(0);
        }
    };

    let records: Vec<PendingRecord> = match serde_json::from_str(&raw) {
        Ok(records) => records,
        Err(e) => {
            // 顶层解析失败时丢弃整个列表，不做部分重试
            warn!("malformed pending list, discarding: {}", e);
            pending.clear(PENDING_KEY).await?;
            return Ok(0);
        }
    };

    info!("replaying {} pending operations", records.len());
    let mut replayed = 0;

    for record in records {
        match dispatch(client, &record).await {
            Ok(()) => replayed += 1,
            Err(e) => {
                warn!(
                    "pending replay failed: type={}, error={}",
                    record.operation_type, e
                );
            }
        }
    }

    // 无论单条成败，尝试完毕后清除记录
    pending.clear(PENDING_KEY).await?;
    info!("pending replay done: replayed={}", replayed);
    Ok(replayed)
}

/// 将单条记录分发到对应的变更入口
async fn dispatch(client: &DataClient, record: &PendingRecord) -> Result<()> {
    match record.operation_type.as_str() {
        "create_mission" => {
            let payload: CreateMissionPayload = serde_json::from_value(record.payload.clone())?;
            client
                .create_mission(&payload.user_id, payload.draft)
                .await?;
            Ok(())
        }
        "complete_mission" => {
            let payload: CompleteMissionPayload = serde_json::from_value(record.payload.clone())?;
            client
                .complete_mission(&payload.user_id, payload.mission_id, payload.date)
                .await?;
            Ok(())
        }
        "delete_mission" => {
            let payload: DeleteMissionPayload = serde_json::from_value(record.payload.clone())?;
            let ticket = client
                .delete_mission(&payload.user_id, payload.mission_id)
                .await?;
            ticket.wait().await
        }
        other => Err(SyncError::ReplayError(format!(
            "unknown operation type: {}",
            other
        ))),
    }
}
