use serde::{Deserialize, Serialize};
use stash_api::ObjectStorageClient;
use std::sync::Arc;
use thiserror::Error;

/// 本地文件系统存储的保留ID
pub const LOCAL_STORAGE_ID: i32 = -1;
/// 数据库（内联）存储的保留ID
pub const DATABASE_STORAGE_ID: i32 = 0;

/// 存储配置错误
#[derive(Error, Debug)]
pub enum StorageConfigError {
    #[error("invalid storage service id setting: {0}")]
    InvalidServiceId(String),

    #[error("storage {0} not found")]
    NotFound(i32),

    #[error("malformed config of storage {id}: {source}")]
    MalformedConfig {
        id: i32,
        #[source]
        source: serde_json::Error,
    },
}

/// 上传时使用的存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// 内容内联保存在元数据中
    Database,
    /// 保存到本地数据目录
    LocalFilesystem,
    /// 保存到已注册的远程对象存储
    RemoteObjectStorage(i32),
}

impl StorageBackend {
    /// 从存储服务ID转换
    pub fn from_service_id(id: i32) -> Self {
        match id {
            LOCAL_STORAGE_ID => StorageBackend::LocalFilesystem,
            DATABASE_STORAGE_ID => StorageBackend::Database,
            other => StorageBackend::RemoteObjectStorage(other),
        }
    }

    /// 转换为存储服务ID
    pub fn service_id(&self) -> i32 {
        match self {
            StorageBackend::LocalFilesystem => LOCAL_STORAGE_ID,
            StorageBackend::Database => DATABASE_STORAGE_ID,
            StorageBackend::RemoteObjectStorage(id) => *id,
        }
    }

    /// 解析 `storage-service-id` 设置（JSON编码的整数），未设置时使用数据库存储
    pub fn from_setting(value: Option<&str>) -> Result<Self, StorageConfigError> {
        match value.map(str::trim) {
            None | Some("") => Ok(StorageBackend::Database),
            Some(raw) => serde_json::from_str::<i32>(raw)
                .map(Self::from_service_id)
                .map_err(|_| StorageConfigError::InvalidServiceId(raw.to_string())),
        }
    }
}

/// 远程存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageType {
    S3,
}

/// ObjectStorage 已注册的远程存储记录
/// `config` 保存原始JSON，使用时再解析
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorage {
    pub id: i32,
    pub name: String,
    #[serde(rename = "type")]
    pub storage_type: StorageType,
    pub config: String,
}

impl ObjectStorage {
    /// 解析S3连接配置
    pub fn s3_config(&self) -> Result<S3Config, StorageConfigError> {
        match self.storage_type {
            StorageType::S3 => serde_json::from_str(&self.config)
                .map_err(|source| StorageConfigError::MalformedConfig { id: self.id, source }),
        }
    }
}

/// S3兼容存储的连接配置
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct S3Config {
    pub end_point: String,
    #[serde(default)]
    pub region: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// 对象键的路径模板
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub url_prefix: String,
    #[serde(default)]
    pub url_suffix: String,
}

impl S3Config {
    /// 生成对象的访问链接
    pub fn object_url(&self, key: &str) -> String {
        let key = key.trim_start_matches('/');
        if self.url_prefix.is_empty() {
            format!(
                "{}/{}/{}{}",
                self.end_point.trim_end_matches('/'),
                self.bucket,
                key,
                self.url_suffix
            )
        } else {
            format!("{}/{}{}", self.url_prefix.trim_end_matches('/'), key, self.url_suffix)
        }
    }
}

/// 根据连接配置创建对象存储客户端
pub trait ObjectStorageConnector: Send + Sync {
    fn connect(&self, config: &S3Config) -> anyhow::Result<Arc<dyn ObjectStorageClient>>;
}

// 不输出密钥
impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("end_point", &self.end_point)
            .field("region", &self.region)
            .field("access_key", &"***")
            .field("secret_key", &"***")
            .field("bucket", &self.bucket)
            .field("path", &self.path)
            .field("url_prefix", &self.url_prefix)
            .field("url_suffix", &self.url_suffix)
            .finish()
    }
}
