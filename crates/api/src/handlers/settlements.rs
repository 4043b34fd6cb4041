use axum::extract::{Path, Query, State};
use serde::Deserialize;

use turnover_domain::value_objects::SettlementPeriod;

use crate::{error::ApiResult, response::success, routes::AppState};

/// 结算查询参数
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// 结算周期，形如 "2024-03"
    pub period: String,
}

/// 保洁员某周期的对账单
pub async fn get_settlement(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let period = SettlementPeriod::parse(&query.period)?;
    let statement = state.settlement.settle(&worker_id, period).await?;
    Ok(success(statement))
}

/// 保洁员月度汇总（收入 + 工作量）
pub async fn get_worker_summary(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
    Query(query): Query<PeriodQuery>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let period = SettlementPeriod::parse(&query.period)?;
    let summary = state
        .aggregator
        .worker_monthly_summary(&worker_id, period)
        .await?;
    Ok(success(summary))
}
