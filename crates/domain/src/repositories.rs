//! 领域仓储抽象
//!
//! 定义数据访问的抽象接口，遵循依赖倒置原则。
//! 认领/完成/改派等写入必须是存储侧的原子条件更新（比较并交换），
//! 返回 `bool` 表示条件是否在写入时刻仍然成立。

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{CleaningTask, Reservation, Worker};
use turnover_core::TurnoverResult;

/// 保洁任务仓储抽象（底层为外部订单存储）
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 写入一条订单（嵌入式/测试环境使用；生产部署由订单系统落库）
    async fn create(&self, reservation: &Reservation) -> TurnoverResult<Reservation>;

    async fn get_by_id(&self, id: i64) -> TurnoverResult<Option<CleaningTask>>;

    /// 指定房源范围内的可认领任务（未指派且待打扫）
    async fn list_available_for_properties(
        &self,
        property_ids: &[i64],
    ) -> TurnoverResult<Vec<CleaningTask>>;

    /// 全部未指派的待打扫任务
    async fn list_unassigned_pending(&self) -> TurnoverResult<Vec<CleaningTask>>;

    /// 某保洁员名下进行中的任务
    async fn list_assigned_to(&self, worker_id: &str) -> TurnoverResult<Vec<CleaningTask>>;

    /// 全部待打扫任务（含已指派），用于看板汇总
    async fn list_pending(&self) -> TurnoverResult<Vec<CleaningTask>>;

    /// 某保洁员已完成、退房时刻落在 [from, to) 内的任务
    async fn list_completed_for_worker(
        &self,
        worker_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> TurnoverResult<Vec<CleaningTask>>;

    /// 原子认领：仅当任务仍未指派且待打扫时写入成功
    ///
    /// 两个并发认领者中恰有一个得到 `true`；禁止读后写实现。
    async fn try_claim(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool>;

    /// 原子完成：仅当任务仍指派给该保洁员且待打扫时写入成功
    async fn try_complete(&self, task_id: i64, worker_id: &str) -> TurnoverResult<bool>;

    /// 原子改派/取消指派（`worker_id` 为 None 即放回池中）：
    /// 仅当任务尚未完成时写入成功
    async fn try_assign(&self, task_id: i64, worker_id: Option<&str>) -> TurnoverResult<bool>;

    /// 更新已完成任务的评分与备注（完成后唯一允许的变更）
    async fn update_feedback(
        &self,
        task_id: i64,
        rating: Option<i16>,
        notes: Option<&str>,
    ) -> TurnoverResult<bool>;
}

/// 保洁员仓储抽象
#[async_trait]
pub trait WorkerRepository: Send + Sync {
    async fn register(&self, worker: &Worker) -> TurnoverResult<Worker>;
    async fn get_by_id(&self, id: &str) -> TurnoverResult<Option<Worker>>;
    async fn get_all(&self) -> TurnoverResult<Vec<Worker>>;
    async fn update(&self, worker: &Worker) -> TurnoverResult<()>;
    async fn unregister(&self, id: &str) -> TurnoverResult<bool>;
}
