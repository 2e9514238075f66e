pub mod multipart_with_user;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use stash_api::AuthenticatedUser;

use crate::error::ApiError;

/// 当前用户提取器
/// 从请求扩展中提取已认证的用户信息，未登录时返回401
pub struct CurrentUser(pub AuthenticatedUser);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// 可选的当前用户，匿名访问时为 `None`
pub struct MaybeUser(pub Option<AuthenticatedUser>);

#[async_trait::async_trait]
impl<S> FromRequestParts<S> for MaybeUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(parts.extensions.get::<AuthenticatedUser>().cloned()))
    }
}
