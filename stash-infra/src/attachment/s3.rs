use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use opendal::{services, Operator};
use stash_api::{ObjectStorageClient, UploadedObject};
use stash_domain::{ObjectStorageConnector, S3Config};
use std::sync::Arc;

/// 基于OpenDAL的S3兼容对象存储客户端
pub struct S3ObjectStorageClient {
    operator: Operator,
    config: S3Config,
}

impl S3ObjectStorageClient {
    pub fn new(config: S3Config) -> Result<Self> {
        // 未配置region时使用"auto"（R2等服务的约定）
        let region = if config.region.is_empty() { "auto" } else { config.region.as_str() };
        let builder = services::S3::default()
            .root("/")
            .endpoint(&config.end_point)
            .region(region)
            .bucket(&config.bucket)
            .access_key_id(&config.access_key)
            .secret_access_key(&config.secret_key);

        let operator = Operator::new(builder)
            .map_err(|e| anyhow::anyhow!("Failed to create s3 client: {}", e))?
            .finish();
        Ok(Self { operator, config })
    }
}

#[async_trait]
impl ObjectStorageClient for S3ObjectStorageClient {
    async fn upload_file(&self, key: &str, content_type: &str, content: Bytes) -> Result<UploadedObject> {
        let key = key.trim_start_matches('/');
        self.operator
            .write_with(key, content)
            .content_type(content_type)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to upload object {}: {}", key, e))?;

        Ok(UploadedObject {
            key: key.to_string(),
            url: self.config.object_url(key),
        })
    }
}

/// 为每次上传按配置创建S3客户端
#[derive(Debug, Default, Clone, Copy)]
pub struct S3ObjectStorageConnector;

impl ObjectStorageConnector for S3ObjectStorageConnector {
    fn connect(&self, config: &S3Config) -> Result<Arc<dyn ObjectStorageClient>> {
        Ok(Arc::new(S3ObjectStorageClient::new(config.clone())?))
    }
}
