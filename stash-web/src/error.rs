use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use stash_service::ResourceError;
use thiserror::Error;
use tracing::error;

/// 处理器返回的错误
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error("{0}")]
    BadRequest(String),

    #[error("Missing user in session")]
    Unauthorized,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Resource(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            ApiError::Resource(e) => {
                if status.is_server_error() {
                    error!("Request failed: {:#}", e);
                }
                e.public_message()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}
