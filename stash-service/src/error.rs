use stash_domain::StorageConfigError;
use thiserror::Error;

/// 写入存储后端时的错误
#[derive(Error, Debug)]
pub enum PersistError {
    /// 存储设置或远程存储配置无效
    #[error("storage configuration error: {0}")]
    Configuration(String),

    /// 本地文件写入失败
    #[error("failed to write file: {0:#}")]
    Io(anyhow::Error),

    /// 远程对象存储上传失败
    #[error("failed to upload object: {0:#}")]
    Upload(anyhow::Error),
}

impl From<StorageConfigError> for PersistError {
    fn from(e: StorageConfigError) -> Self {
        PersistError::Configuration(e.to_string())
    }
}

/// 缩略图生成错误
#[derive(Error, Debug)]
pub enum ThumbnailError {
    /// 正在生成的缩略图已达上限
    #[error("too many thumbnails are being generated")]
    CapacityExceeded,

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode thumbnail: {0}")]
    Encode(#[source] image::ImageError),

    #[error("thumbnail cache io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 资源服务错误
#[derive(Error, Debug)]
pub enum ResourceError {
    #[error("resource not found")]
    NotFound,

    #[error("unauthorized access")]
    Unauthorized,

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Persist(#[from] PersistError),

    /// 读取已存储内容失败
    #[error("failed to read resource content: {0:#}")]
    Io(anyhow::Error),

    #[error("internal error: {0:#}")]
    Internal(anyhow::Error),
}

impl ResourceError {
    /// 对应的HTTP状态码
    pub fn status_code(&self) -> u16 {
        match self {
            ResourceError::NotFound => 404,
            ResourceError::Unauthorized => 401,
            ResourceError::InvalidArgument(_) => 400,
            ResourceError::Persist(_) | ResourceError::Io(_) | ResourceError::Internal(_) => 500,
        }
    }

    /// 返回给客户端的消息，内部错误不暴露细节
    pub fn public_message(&self) -> String {
        match self {
            ResourceError::NotFound => "Resource not found".to_string(),
            ResourceError::Unauthorized => "Unauthorized access".to_string(),
            ResourceError::InvalidArgument(message) => message.clone(),
            ResourceError::Persist(_) => "Failed to save resource".to_string(),
            ResourceError::Io(_) => "Failed to read resource content".to_string(),
            ResourceError::Internal(_) => "Internal server error".to_string(),
        }
    }
}

impl From<anyhow::Error> for ResourceError {
    fn from(e: anyhow::Error) -> Self {
        ResourceError::Internal(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ResourceError::NotFound.status_code(), 404);
        assert_eq!(ResourceError::Unauthorized.status_code(), 401);
        assert_eq!(ResourceError::InvalidArgument("bad".into()).status_code(), 400);
        assert_eq!(
            ResourceError::from(PersistError::Configuration("x".into())).status_code(),
            500
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let error = ResourceError::Internal(anyhow::anyhow!("db password is hunter2"));
        assert!(!error.public_message().contains("hunter2"));
        assert!(error.to_string().contains("hunter2"));
    }
}
