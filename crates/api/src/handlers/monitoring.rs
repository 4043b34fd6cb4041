use axum::extract::{Query, State};
use serde::Deserialize;

use crate::{error::ApiResult, response::success, routes::AppState};

/// 风险预警查询参数
#[derive(Debug, Deserialize)]
pub struct FleetRiskQuery {
    pub days_ahead: Option<i64>,
}

/// 房源维度的待办与超期统计（管理看板）
pub async fn get_property_summaries(
    State(state): State<AppState>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let summaries = state.aggregator.property_summaries().await?;
    Ok(success(summaries))
}

/// 未认领任务的风险预警
pub async fn get_fleet_risk_alerts(
    State(state): State<AppState>,
    Query(query): Query<FleetRiskQuery>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let days_ahead = query.days_ahead.unwrap_or(state.default_alert_days);
    let alerts = state.aggregator.fleet_risk_alerts(days_ahead).await?;
    Ok(success(alerts))
}
