use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use turnover_core::{TurnoverError, TurnoverResult};
use turnover_domain::entities::{sort_by_urgency, Platform};
use turnover_domain::repositories::{TaskRepository, WorkerRepository};
use turnover_domain::value_objects::{SettlementPeriod, UrgencyLevel, WorkWindow};

use crate::settlement::SettlementCalculator;

/// 保洁员月度汇总
#[derive(Debug, Clone, Serialize)]
pub struct WorkerMonthlySummary {
    pub worker_id: String,
    pub period: SettlementPeriod,
    pub received_total: f64,
    pub pending_total: f64,
    pub completed_count: usize,
    pub assigned_count: usize,
}

/// 房源维度的待办汇总
#[derive(Debug, Clone, Serialize)]
pub struct PropertySummary {
    pub property_id: i64,
    pub pending_count: usize,
    pub unassigned_count: usize,
    pub overdue_count: usize,
}

/// 全局风险预警：即将进入紧急状态仍无人认领的任务
#[derive(Debug, Clone, Serialize)]
pub struct RiskAlert {
    pub task_id: i64,
    pub property_id: i64,
    pub platform: Platform,
    pub urgency: UrgencyLevel,
    pub window: WorkWindow,
    /// 窗口进入紧急区间的时刻（已过则为当前即紧急/已过期）
    pub becomes_critical_at: DateTime<Utc>,
}

/// 汇总视图：纯读侧组合，不引入新的不变量
pub struct Aggregator {
    task_repo: Arc<dyn TaskRepository>,
    worker_repo: Arc<dyn WorkerRepository>,
    settlement: Arc<SettlementCalculator>,
}

impl Aggregator {
    pub fn new(
        task_repo: Arc<dyn TaskRepository>,
        worker_repo: Arc<dyn WorkerRepository>,
        settlement: Arc<SettlementCalculator>,
    ) -> Self {
        Self {
            task_repo,
            worker_repo,
            settlement,
        }
    }

    /// 保洁员月度收入与工作量
    pub async fn worker_monthly_summary(
        &self,
        worker_id: &str,
        period: SettlementPeriod,
    ) -> TurnoverResult<WorkerMonthlySummary> {
        self.worker_repo
            .get_by_id(worker_id)
            .await?
            .ok_or_else(|| TurnoverError::worker_not_found(worker_id))?;

        let statement = self.settlement.settle(worker_id, period).await?;
        let assigned = self.task_repo.list_assigned_to(worker_id).await?;

        Ok(WorkerMonthlySummary {
            worker_id: worker_id.to_string(),
            period,
            received_total: statement.received_total,
            pending_total: statement.pending_total,
            completed_count: statement.line_items.len(),
            assigned_count: assigned.len(),
        })
    }

    /// 房源维度的待办与超期统计
    pub async fn property_summaries(&self) -> TurnoverResult<Vec<PropertySummary>> {
        let tasks = self.task_repo.list_pending().await?;
        let now = Utc::now();

        let mut by_property: BTreeMap<i64, PropertySummary> = BTreeMap::new();
        for task in &tasks {
            let entry = by_property
                .entry(task.property_id)
                .or_insert_with(|| PropertySummary {
                    property_id: task.property_id,
                    pending_count: 0,
                    unassigned_count: 0,
                    overdue_count: 0,
                });
            entry.pending_count += 1;
            if task.assigned_worker_id.is_none() {
                entry.unassigned_count += 1;
            }
            if task.urgency(now) == UrgencyLevel::Overdue {
                entry.overdue_count += 1;
            }
        }

        Ok(by_property.into_values().collect())
    }

    /// 未认领任务的风险预警
    ///
    /// 列出 `days_ahead` 天内将进入紧急区间（含已紧急/已过期）
    /// 且仍无人认领的任务，最紧急在前。
    pub async fn fleet_risk_alerts(&self, days_ahead: i64) -> TurnoverResult<Vec<RiskAlert>> {
        if days_ahead < 0 {
            return Err(TurnoverError::invalid_params(format!(
                "预警窗口天数不能为负: {days_ahead}"
            )));
        }

        let mut tasks = self.task_repo.list_unassigned_pending().await?;
        let now = Utc::now();
        let horizon = now + Duration::days(days_ahead);

        sort_by_urgency(&mut tasks, now);

        let alerts: Vec<RiskAlert> = tasks
            .iter()
            .filter(|task| task.work_window().critical_at() <= horizon)
            .map(|task| {
                let window = task.work_window();
                RiskAlert {
                    task_id: task.id,
                    property_id: task.property_id,
                    platform: task.platform,
                    urgency: UrgencyLevel::classify(&window, now),
                    window,
                    becomes_critical_at: window.critical_at(),
                }
            })
            .collect();

        debug!(
            "风险预警：{} 天窗口内共 {} 条未认领任务告警",
            days_ahead,
            alerts.len()
        );
        Ok(alerts)
    }
}
