use serde::{Deserialize, Serialize};

/// 认证后的用户信息
/// 由认证中间件注入请求扩展，资源引擎只消费它，不负责签发
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub id: i32,
    pub username: String,
}

impl AuthenticatedUser {
    pub fn new(id: i32, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
        }
    }

    /// 是否为指定的用户
    pub fn is(&self, user_id: i32) -> bool {
        self.id == user_id
    }
}

/// 认证结果
#[derive(Debug, Clone)]
pub enum AuthenticationResult {
    /// 认证成功
    Authenticated(AuthenticatedUser),
    /// 未认证（没有提供凭证）
    Unauthenticated,
    /// 认证失败（凭证无效）
    Failed(String),
}

impl AuthenticationResult {
    /// 取出认证成功的用户，其余情况一律视为匿名
    pub fn into_user(self) -> Option<AuthenticatedUser> {
        match self {
            AuthenticationResult::Authenticated(user) => Some(user),
            AuthenticationResult::Unauthenticated | AuthenticationResult::Failed(_) => None,
        }
    }
}
