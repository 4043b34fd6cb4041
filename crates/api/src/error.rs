use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use turnover_core::TurnoverError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("协调核心错误: {0}")]
    Turnover(#[from] TurnoverError),

    #[error("请求参数错误: {0}")]
    BadRequest(String),

    #[error("缺少操作者身份")]
    MissingActor,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_type, suggestions) = match &self {
            ApiError::Turnover(TurnoverError::TaskNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("保洁任务 {} 不存在", id),
                "TASK_NOT_FOUND".to_string(),
                vec!["任务可能随订单删除，请刷新任务列表".to_string()],
            ),
            ApiError::Turnover(TurnoverError::WorkerNotFound { id }) => (
                StatusCode::NOT_FOUND,
                format!("保洁员 {} 不存在", id),
                "WORKER_NOT_FOUND".to_string(),
                vec!["请检查保洁员ID是否正确".to_string()],
            ),
            ApiError::Turnover(TurnoverError::TaskAlreadyClaimed { id }) => (
                StatusCode::CONFLICT,
                format!("任务 {} 已被其他保洁员认领", id),
                "TASK_ALREADY_CLAIMED".to_string(),
                vec!["请刷新可认领列表后重试".to_string()],
            ),
            ApiError::Turnover(TurnoverError::ActiveTaskConflict {
                worker_id,
                active_task_id,
            }) => (
                StatusCode::CONFLICT,
                format!(
                    "保洁员 {} 已持有进行中的任务 {}",
                    worker_id, active_task_id
                ),
                "ACTIVE_TASK_CONFLICT".to_string(),
                vec![
                    "请先完成当前任务".to_string(),
                    "紧急或已过期任务不受单任务限制".to_string(),
                ],
            ),
            ApiError::Turnover(TurnoverError::PrematureCompletion { id }) => (
                StatusCode::CONFLICT,
                format!("任务 {} 的退房时间未到，不能标记完成", id),
                "PREMATURE_COMPLETION".to_string(),
                vec!["请在客人退房之后再完成任务".to_string()],
            ),
            ApiError::Turnover(TurnoverError::TaskImmutable { id }) => (
                StatusCode::CONFLICT,
                format!("任务 {} 已完成，指派不可再变更", id),
                "TASK_IMMUTABLE".to_string(),
                vec!["已完成任务仅允许补充评分与备注".to_string()],
            ),
            ApiError::Turnover(TurnoverError::PermissionDenied(msg)) => (
                StatusCode::FORBIDDEN,
                format!("权限不足: {}", msg),
                "PERMISSION_DENIED".to_string(),
                vec!["该操作需要管理员身份".to_string()],
            ),
            ApiError::Turnover(TurnoverError::InvalidPeriod(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("结算周期无效: {}", msg),
                "INVALID_PERIOD".to_string(),
                vec!["周期格式应为 YYYY-MM，例如 2024-03".to_string()],
            ),
            ApiError::Turnover(TurnoverError::InvalidParams(msg)) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数无效: {}", msg),
                "INVALID_PARAMS".to_string(),
                vec!["请检查请求参数后重试".to_string()],
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                format!("请求参数错误: {}", msg),
                "BAD_REQUEST".to_string(),
                vec!["请检查请求格式和参数".to_string()],
            ),
            ApiError::MissingActor => (
                StatusCode::BAD_REQUEST,
                "缺少操作者身份".to_string(),
                "MISSING_ACTOR".to_string(),
                vec!["请在请求头中提供 X-Actor-Id".to_string()],
            ),
            ApiError::Turnover(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "系统内部错误".to_string(),
                "INTERNAL_ERROR".to_string(),
                vec!["系统遇到内部错误，请稍后重试".to_string()],
            ),
        };

        let body = Json(json!({
            "error": {
                "message": error_message,
                "type": error_type,
                "code": status.as_u16(),
                "suggestions": suggestions,
                "timestamp": chrono::Utc::now().to_rfc3339(),
            }
        }));

        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_conflict_maps_to_409() {
        let error = ApiError::Turnover(TurnoverError::TaskAlreadyClaimed { id: 7 });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let error = ApiError::Turnover(TurnoverError::TaskNotFound { id: 7 });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_permission_denied_maps_to_403() {
        let error = ApiError::Turnover(TurnoverError::PermissionDenied("测试".to_string()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_internal_errors_map_to_500() {
        let error = ApiError::Turnover(TurnoverError::DatabaseOperation("坏掉了".to_string()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_premature_completion_maps_to_409() {
        let error = ApiError::Turnover(TurnoverError::PrematureCompletion { id: 1 });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
