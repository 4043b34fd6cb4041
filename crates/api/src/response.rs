use axum::{http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 统一的响应包装
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            timestamp: Utc::now(),
        }
    }

    pub fn with_message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T> IntoResponse for ApiResponse<T>
where
    T: Serialize,
{
    fn into_response(self) -> axum::response::Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// 成功响应的快捷方式
pub fn success<T: Serialize>(data: T) -> ApiResponse<T> {
    ApiResponse::ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_wraps_payload() {
        let response = ApiResponse::ok(vec![1, 2, 3]);

        assert!(response.success);
        assert_eq!(response.data, Some(vec![1, 2, 3]));
        assert!(response.message.is_none());
        assert!(response.timestamp <= Utc::now());
    }

    #[test]
    fn test_with_message() {
        let response = ApiResponse::ok(()).with_message("已认领");
        assert_eq!(response.message.as_deref(), Some("已认领"));
    }

    #[test]
    fn test_serialization_omits_empty_fields() {
        let response = ApiResponse::ok("x");
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains("\"success\":true"));
        assert!(json.contains("\"data\":\"x\""));
        assert!(!json.contains("\"message\""));
    }

    #[test]
    fn test_deserialization_tolerates_missing_fields() {
        let parsed: ApiResponse<String> = serde_json::from_str(
            r#"{"success":true,"timestamp":"2024-03-01T00:00:00Z"}"#,
        )
        .unwrap();

        assert!(parsed.success);
        assert!(parsed.data.is_none());
        assert!(parsed.message.is_none());
    }
}
