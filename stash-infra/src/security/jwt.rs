use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use stash_api::AuthenticatedUser;

/// JWT Claims结构
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,  // subject (user id)
    pub name: String, // username
    pub exp: usize,   // expiration time
    pub iat: usize,   // issued at
    pub iss: String,  // issuer
}

impl Claims {
    pub fn new(user: &AuthenticatedUser, issuer: String, expiration_seconds: u64) -> Self {
        let now = chrono::Utc::now().timestamp().max(0) as usize;

        Self {
            sub: user.id.to_string(),
            name: user.username.clone(),
            exp: now + expiration_seconds as usize,
            iat: now,
            iss: issuer,
        }
    }
}

/// JWT服务
/// 只负责校验访问令牌，签发由外部的认证系统完成
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
}

impl JwtService {
    /// 创建新的JWT服务
    pub fn new(secret: &str, issuer: impl Into<String>) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            issuer: issuer.into(),
        }
    }

    /// 生成JWT令牌
    pub fn generate(&self, user: &AuthenticatedUser, expiration_seconds: u64) -> anyhow::Result<String> {
        let claims = Claims::new(user, self.issuer.clone(), expiration_seconds);
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("JWT encode error: {}", e))
    }

    /// 验证JWT令牌，返回令牌代表的用户
    pub fn verify(&self, token: &str) -> anyhow::Result<AuthenticatedUser> {
        let mut validation = Validation::default();
        validation.set_issuer(&[&self.issuer]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("JWT decode error: {}", e))?;

        let id = token_data
            .claims
            .sub
            .parse::<i32>()
            .map_err(|_| anyhow::anyhow!("JWT subject is not a user id: {}", token_data.claims.sub))?;
        Ok(AuthenticatedUser::new(id, token_data.claims.name))
    }
}
