use thiserror::Error;

/// 协调核心错误类型定义
#[derive(Debug, Error, Clone)]
pub enum TurnoverError {
    #[error("数据库操作失败: {0}")]
    DatabaseOperation(String),

    #[error("保洁任务不存在: id={id}")]
    TaskNotFound { id: i64 },

    #[error("保洁员不存在: id={id}")]
    WorkerNotFound { id: String },

    #[error("任务已被其他保洁员抢先认领: id={id}")]
    TaskAlreadyClaimed { id: i64 },

    #[error("保洁员 {worker_id} 已持有进行中的任务 {active_task_id}")]
    ActiveTaskConflict {
        worker_id: String,
        active_task_id: i64,
    },

    #[error("退房时间未到，任务不能标记完成: id={id}")]
    PrematureCompletion { id: i64 },

    #[error("任务已完成，不允许再变更指派: id={id}")]
    TaskImmutable { id: i64 },

    #[error("权限不足: {0}")]
    PermissionDenied(String),

    #[error("结算周期格式无效: {0}")]
    InvalidPeriod(String),

    #[error("请求参数无效: {0}")]
    InvalidParams(String),

    #[error("数据序列化错误: {0}")]
    Serialization(String),

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("系统内部错误: {0}")]
    Internal(String),
}

impl TurnoverError {
    pub fn database_error<S: Into<String>>(msg: S) -> Self {
        Self::DatabaseOperation(msg.into())
    }
    pub fn task_not_found(id: i64) -> Self {
        Self::TaskNotFound { id }
    }
    pub fn worker_not_found<S: Into<String>>(id: S) -> Self {
        Self::WorkerNotFound { id: id.into() }
    }
    pub fn permission_denied<S: Into<String>>(msg: S) -> Self {
        Self::PermissionDenied(msg.into())
    }
    pub fn invalid_params<S: Into<String>>(msg: S) -> Self {
        Self::InvalidParams(msg.into())
    }
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// 认领协议类错误：重新拉取列表后重试即可恢复
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TurnoverError::TaskAlreadyClaimed { .. }
                | TurnoverError::ActiveTaskConflict { .. }
                | TurnoverError::PrematureCompletion { .. }
                | TurnoverError::TaskNotFound { .. }
        )
    }
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            TurnoverError::DatabaseOperation(_) | TurnoverError::Internal(_)
        )
    }
}

impl From<sqlx::Error> for TurnoverError {
    fn from(err: sqlx::Error) -> Self {
        TurnoverError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for TurnoverError {
    fn from(err: serde_json::Error) -> Self {
        TurnoverError::Serialization(err.to_string())
    }
}

impl From<anyhow::Error> for TurnoverError {
    fn from(err: anyhow::Error) -> Self {
        TurnoverError::Internal(err.to_string())
    }
}
