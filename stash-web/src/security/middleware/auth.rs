use axum::extract::{Request, State};
use axum::http::{header, HeaderMap};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::cookie::CookieJar;
use stash_api::AuthenticationResult;
use stash_infra::security::JwtService;
use tracing::debug;

use crate::AppState;

/// 保存访问令牌的Cookie名称
pub const ACCESS_TOKEN_COOKIE: &str = "access-token";

/// 从请求头中提取令牌：优先 `Authorization: Bearer`，其次Cookie
fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty());

    bearer.or_else(|| {
        CookieJar::from_headers(headers)
            .get(ACCESS_TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_string())
            .filter(|token| !token.is_empty())
    })
}

/// 认证请求
pub fn authenticate(jwt_service: &JwtService, headers: &HeaderMap) -> AuthenticationResult {
    let Some(token) = extract_token(headers) else {
        return AuthenticationResult::Unauthenticated;
    };

    match jwt_service.verify(&token) {
        Ok(user) => AuthenticationResult::Authenticated(user),
        Err(e) => AuthenticationResult::Failed(e.to_string()),
    }
}

/// 认证中间件
/// 从请求中提取认证信息，将用户信息注入请求扩展
/// 认证失败时按匿名请求继续处理，由处理器决定是否需要登录
pub async fn auth_middleware(State(state): State<AppState>, mut request: Request, next: Next) -> Response {
    match authenticate(&state.jwt_service, request.headers()) {
        AuthenticationResult::Authenticated(user) => {
            request.extensions_mut().insert(user);
        }
        AuthenticationResult::Failed(reason) => {
            debug!("Ignoring invalid access token: {}", reason);
        }
        AuthenticationResult::Unauthenticated => {}
    }

    next.run(request).await
}
