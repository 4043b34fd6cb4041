use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::{actor::CallerIdentity, error::ApiResult, response::success, routes::AppState};

/// 改派请求
#[derive(Debug, Deserialize)]
pub struct ReassignRequest {
    pub new_worker_id: String,
}

/// 评价请求
#[derive(Debug, Deserialize)]
pub struct AnnotateRequest {
    pub rating: Option<i16>,
    pub notes: Option<String>,
}

/// 保洁员可认领的任务列表（带紧急度标签，最紧急在前）
pub async fn list_available(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let tasks = state.task_pool.list_available(&worker_id).await?;
    Ok(success(tasks))
}

/// 保洁员名下进行中的任务列表（带渲染后的工作窗口）
pub async fn list_assigned(
    State(state): State<AppState>,
    Path(worker_id): Path<String>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let tasks = state.task_pool.list_assigned(&worker_id).await?;
    Ok(success(tasks))
}

/// 认领任务
pub async fn claim_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CallerIdentity(actor): CallerIdentity,
) -> ApiResult<impl axum::response::IntoResponse> {
    let view = state.task_pool.claim(id, &actor).await?;
    Ok(success(view))
}

/// 完成任务
pub async fn complete_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CallerIdentity(actor): CallerIdentity,
) -> ApiResult<impl axum::response::IntoResponse> {
    let view = state.task_pool.complete(id, &actor).await?;
    Ok(success(view))
}

/// 改派任务（管理员）
pub async fn reassign_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CallerIdentity(actor): CallerIdentity,
    Json(request): Json<ReassignRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    let view = state
        .task_pool
        .reassign(id, &request.new_worker_id, &actor)
        .await?;
    Ok(success(view))
}

/// 取消指派，任务放回池中（管理员）
pub async fn unassign_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CallerIdentity(actor): CallerIdentity,
) -> ApiResult<impl axum::response::IntoResponse> {
    let view = state.task_pool.unassign(id, &actor).await?;
    Ok(success(view))
}

/// 为已完成任务补充评分与备注
pub async fn annotate_task(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    CallerIdentity(actor): CallerIdentity,
    Json(request): Json<AnnotateRequest>,
) -> ApiResult<impl axum::response::IntoResponse> {
    state
        .task_pool
        .annotate(id, request.rating, request.notes.as_deref(), &actor)
        .await?;
    Ok(success(serde_json::json!({ "task_id": id })))
}
