//! HTTP 接入层
//!
//! 把协调服务暴露给 UI 与报表端。本层只做参数解析、身份提取与
//! 错误到状态码的映射，不包含业务规则。

pub mod actor;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;

pub use error::{ApiError, ApiResult};
pub use response::ApiResponse;
pub use routes::{create_routes, AppState};
