use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use turnover_core::{TurnoverError, TurnoverResult};
use turnover_domain::entities::{sort_by_urgency, CleaningTask, Platform};
use turnover_domain::repositories::{TaskRepository, WorkerRepository};
use turnover_domain::value_objects::{Actor, UrgencyLevel, WorkWindow};

/// 任务列表条目：窗口与紧急度在读取时刻渲染
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: i64,
    pub property_id: i64,
    pub platform: Platform,
    pub checkout_at: DateTime<Utc>,
    pub window: WorkWindow,
    pub urgency: UrgencyLevel,
    pub fee: Option<f64>,
    pub assigned_worker_id: Option<String>,
}

impl TaskView {
    pub fn render(task: &CleaningTask, now: DateTime<Utc>) -> Self {
        let window = task.work_window();
        Self {
            id: task.id,
            property_id: task.property_id,
            platform: task.platform,
            checkout_at: task.checkout_at,
            window,
            urgency: UrgencyLevel::classify(&window, now),
            fee: task.fee,
            assigned_worker_id: task.assigned_worker_id.clone(),
        }
    }
}

/// 任务池与认领协议
///
/// 状态机：可认领（未指派）→ 进行中（已指派）→ 已完成（终态，仅评分/备注可改）。
/// 所有写操作是单次原子条件更新，竞争由存储侧的比较并交换裁决。
pub struct TaskPoolService {
    task_repo: Arc<dyn TaskRepository>,
    worker_repo: Arc<dyn WorkerRepository>,
}

impl TaskPoolService {
    pub fn new(task_repo: Arc<dyn TaskRepository>, worker_repo: Arc<dyn WorkerRepository>) -> Self {
        Self {
            task_repo,
            worker_repo,
        }
    }

    /// 保洁员可认领的任务列表：限定其服务房源，最紧急在前
    pub async fn list_available(&self, worker_id: &str) -> TurnoverResult<Vec<TaskView>> {
        let worker = self
            .worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| TurnoverError::worker_not_found(worker_id))?;

        if !worker.active || worker.serviceable_property_ids.is_empty() {
            debug!("保洁员 {} 未激活或无服务房源，返回空列表", worker_id);
            return Ok(Vec::new());
        }

        let mut tasks = self
            .task_repo
            .list_available_for_properties(&worker.serviceable_property_ids)
            .await?;

        let now = Utc::now();
        sort_by_urgency(&mut tasks, now);
        Ok(tasks.iter().map(|t| TaskView::render(t, now)).collect())
    }

    /// 保洁员名下进行中的任务列表
    pub async fn list_assigned(&self, worker_id: &str) -> TurnoverResult<Vec<TaskView>> {
        self.worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| TurnoverError::worker_not_found(worker_id))?;

        let mut tasks = self.task_repo.list_assigned_to(worker_id).await?;
        let now = Utc::now();
        sort_by_urgency(&mut tasks, now);
        Ok(tasks.iter().map(|t| TaskView::render(t, now)).collect())
    }

    /// 认领任务
    ///
    /// 先校验单任务限制（紧急/已过期任务允许突破），再发起原子认领；
    /// 条件写入未命中说明被并发认领抢先，返回 `TaskAlreadyClaimed`。
    pub async fn claim(&self, task_id: i64, actor: &Actor) -> TurnoverResult<TaskView> {
        let worker = self
            .worker_repo
            .get_by_id(&actor.id)
            .await?
            .ok_or_else(|| TurnoverError::worker_not_found(&actor.id))?;

        let task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or(TurnoverError::TaskNotFound { id: task_id })?;

        if !worker.can_service(task.property_id) {
            return Err(TurnoverError::permission_denied(format!(
                "房源 {} 不在保洁员 {} 的服务范围内",
                task.property_id, worker.id
            )));
        }

        if !task.is_available() {
            return Err(TurnoverError::TaskAlreadyClaimed { id: task_id });
        }

        let now = Utc::now();
        let urgency = task.urgency(now);

        // 单任务限制只在认领时刻校验；紧急/已过期任务放行
        if !urgency.allows_override() {
            let active = self.task_repo.list_assigned_to(&worker.id).await?;
            if let Some(held) = active.first() {
                debug!(
                    "保洁员 {} 已持有任务 {}，拒绝认领普通任务 {}",
                    worker.id, held.id, task_id
                );
                return Err(TurnoverError::ActiveTaskConflict {
                    worker_id: worker.id.clone(),
                    active_task_id: held.id,
                });
            }
        }

        if !self.task_repo.try_claim(task_id, &worker.id).await? {
            debug!("任务 {} 的认领竞争失败（已被抢先）", task_id);
            return Err(TurnoverError::TaskAlreadyClaimed { id: task_id });
        }

        info!(
            "保洁员 {} 认领任务 {} 成功（紧急度: {}）",
            worker.id,
            task_id,
            urgency.as_str()
        );

        let claimed = self.refreshed(task_id).await?;
        Ok(TaskView::render(&claimed, now))
    }

    /// 完成任务
    ///
    /// 仅限当前持有人，且退房时刻已到；否则按业务规则拒绝。
    pub async fn complete(&self, task_id: i64, actor: &Actor) -> TurnoverResult<TaskView> {
        let task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or(TurnoverError::TaskNotFound { id: task_id })?;

        if task.is_done() {
            return Err(TurnoverError::TaskImmutable { id: task_id });
        }

        if !task.is_assigned_to(&actor.id) {
            return Err(TurnoverError::permission_denied(format!(
                "任务 {} 未指派给 {}",
                task_id, actor.id
            )));
        }

        let now = Utc::now();
        if task.work_window().start > now {
            return Err(TurnoverError::PrematureCompletion { id: task_id });
        }

        if !self.task_repo.try_complete(task_id, &actor.id).await? {
            // 前置检查通过但条件写入未命中：状态被并发改掉了，重读后给出准确原因
            return Err(self.stale_write_error(task_id, &actor.id).await);
        }

        info!("保洁员 {} 完成任务 {}", actor.id, task_id);
        let done = self.refreshed(task_id).await?;
        Ok(TaskView::render(&done, now))
    }

    /// 改派任务（管理员操作，绕过单任务限制）
    pub async fn reassign(
        &self,
        task_id: i64,
        new_worker_id: &str,
        actor: &Actor,
    ) -> TurnoverResult<TaskView> {
        self.require_manager(actor, "改派任务")?;

        self.worker_repo
            .get_by_id(new_worker_id)
            .await?
            .ok_or_else(|| TurnoverError::worker_not_found(new_worker_id))?;

        self.assign_checked(task_id, Some(new_worker_id)).await?;

        info!(
            "管理员 {} 将任务 {} 改派给保洁员 {}",
            actor.id, task_id, new_worker_id
        );
        let task = self.refreshed(task_id).await?;
        Ok(TaskView::render(&task, Utc::now()))
    }

    /// 取消指派，任务放回可认领池（管理员操作）
    pub async fn unassign(&self, task_id: i64, actor: &Actor) -> TurnoverResult<TaskView> {
        self.require_manager(actor, "取消指派")?;

        self.assign_checked(task_id, None).await?;

        info!("管理员 {} 将任务 {} 放回任务池", actor.id, task_id);
        let task = self.refreshed(task_id).await?;
        Ok(TaskView::render(&task, Utc::now()))
    }

    /// 为已完成任务写评分与备注（完成后唯一允许的变更）
    pub async fn annotate(
        &self,
        task_id: i64,
        rating: Option<i16>,
        notes: Option<&str>,
        actor: &Actor,
    ) -> TurnoverResult<()> {
        if let Some(r) = rating {
            if !(1..=5).contains(&r) {
                return Err(TurnoverError::invalid_params(format!(
                    "评分必须在1到5之间: {r}"
                )));
            }
        }

        let task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or(TurnoverError::TaskNotFound { id: task_id })?;

        if !task.is_done() {
            return Err(TurnoverError::invalid_params(
                "只能对已完成的任务写评分与备注",
            ));
        }

        if !actor.can_administer() && !task.is_assigned_to(&actor.id) {
            return Err(TurnoverError::permission_denied(format!(
                "任务 {} 不是由 {} 完成的",
                task_id, actor.id
            )));
        }

        self.task_repo.update_feedback(task_id, rating, notes).await?;
        info!("任务 {} 的评价已更新", task_id);
        Ok(())
    }

    fn require_manager(&self, actor: &Actor, operation: &str) -> TurnoverResult<()> {
        if !actor.can_administer() {
            warn!("{} 尝试执行特权操作: {}", actor.id, operation);
            return Err(TurnoverError::permission_denied(format!(
                "{operation}需要管理员权限"
            )));
        }
        Ok(())
    }

    async fn assign_checked(&self, task_id: i64, worker_id: Option<&str>) -> TurnoverResult<()> {
        let task = self
            .task_repo
            .get_by_id(task_id)
            .await?
            .ok_or(TurnoverError::TaskNotFound { id: task_id })?;

        if task.is_done() {
            return Err(TurnoverError::TaskImmutable { id: task_id });
        }

        if !self.task_repo.try_assign(task_id, worker_id).await? {
            // 条件写入未命中：任务在读与写之间被完成或删除
            return match self.task_repo.get_by_id(task_id).await? {
                None => Err(TurnoverError::TaskNotFound { id: task_id }),
                Some(_) => Err(TurnoverError::TaskImmutable { id: task_id }),
            };
        }
        Ok(())
    }

    async fn stale_write_error(&self, task_id: i64, worker_id: &str) -> TurnoverError {
        match self.task_repo.get_by_id(task_id).await {
            Ok(None) => TurnoverError::TaskNotFound { id: task_id },
            Ok(Some(t)) if t.is_done() => TurnoverError::TaskImmutable { id: task_id },
            Ok(Some(_)) => TurnoverError::permission_denied(format!(
                "任务 {task_id} 已不再指派给 {worker_id}"
            )),
            Err(e) => e,
        }
    }

    async fn refreshed(&self, task_id: i64) -> TurnoverResult<CleaningTask> {
        self.task_repo
            .get_by_id(task_id)
            .await?
            .ok_or(TurnoverError::TaskNotFound { id: task_id })
    }
}
