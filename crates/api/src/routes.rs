use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use turnover_coordinator::{Aggregator, SettlementCalculator, TaskPoolService};

use crate::handlers::{
    health::health_check,
    monitoring::{get_fleet_risk_alerts, get_property_summaries},
    settlements::{get_settlement, get_worker_summary},
    tasks::{
        annotate_task, claim_task, complete_task, list_assigned, list_available, reassign_task,
        unassign_task,
    },
};

/// API应用状态
#[derive(Clone)]
pub struct AppState {
    pub task_pool: Arc<TaskPoolService>,
    pub settlement: Arc<SettlementCalculator>,
    pub aggregator: Arc<Aggregator>,
    pub default_alert_days: i64,
}

/// 创建API路由
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        // 健康检查
        .route("/health", get(health_check))
        // 任务池与认领协议
        .route("/api/workers/{id}/tasks/available", get(list_available))
        .route("/api/workers/{id}/tasks/assigned", get(list_assigned))
        .route("/api/tasks/{id}/claim", post(claim_task))
        .route("/api/tasks/{id}/complete", post(complete_task))
        .route("/api/tasks/{id}/reassign", post(reassign_task))
        .route("/api/tasks/{id}/unassign", post(unassign_task))
        .route("/api/tasks/{id}/annotate", post(annotate_task))
        // 结算与汇总
        .route("/api/workers/{id}/settlement", get(get_settlement))
        .route("/api/workers/{id}/summary", get(get_worker_summary))
        .route("/api/properties/summary", get(get_property_summaries))
        .route("/api/alerts/fleet-risk", get(get_fleet_risk_alerts))
        .with_state(state)
}
