use async_trait::async_trait;
use bytes::Bytes;

/// 上传到对象存储后的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedObject {
    /// 对象键
    pub key: String,
    /// 对外访问链接
    pub url: String,
}

/// 对象存储客户端
/// 任何兼容S3的实现都可以满足该接口
#[async_trait]
pub trait ObjectStorageClient: Send + Sync {
    /// 上传文件，返回对象的访问链接
    async fn upload_file(&self, key: &str, content_type: &str, content: Bytes) -> anyhow::Result<UploadedObject>;
}
