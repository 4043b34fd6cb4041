use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use turnover_domain::value_objects::{Actor, ActorRole};

use crate::error::ApiError;

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// 从请求头提取操作者身份
///
/// 身份校验由网关侧的认证层负责（本核心的外部协作方）；这里只把
/// 已认证的身份转换成显式的能力参数传给各操作，缺省角色为保洁员。
#[derive(Debug, Clone)]
pub struct CallerIdentity(pub Actor);

impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(ApiError::MissingActor)?
            .to_string();

        let role = match parts
            .headers
            .get(ACTOR_ROLE_HEADER)
            .and_then(|value| value.to_str().ok())
        {
            None => ActorRole::Worker,
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "" | "worker" => ActorRole::Worker,
                "manager" | "master" => ActorRole::Manager,
                other => {
                    return Err(ApiError::BadRequest(format!("未知的操作者角色: {other}")));
                }
            },
        };

        Ok(CallerIdentity(Actor { id, role }))
    }
}
