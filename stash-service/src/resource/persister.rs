use bytes::Bytes;
use chrono::Utc;
use stash_api::SystemSettingStore;
use stash_domain::setting::{self, constants};
use stash_domain::{ObjectStorageConnector, ResourceCreate, ResourceLocation, StorageBackend, StorageConfigError, StorageRegistry};
use stash_infra::AttachmentStorage;
use std::sync::Arc;
use tracing::{debug, info};

use super::path_template;
use super::upload::UploadBlob;
use crate::error::PersistError;

/// 把上传内容写入当前配置的存储后端
pub struct BlobPersister {
    settings: Arc<dyn SystemSettingStore>,
    storages: Arc<dyn StorageRegistry>,
    connector: Arc<dyn ObjectStorageConnector>,
    local: Arc<dyn AttachmentStorage>,
}

impl BlobPersister {
    pub fn new(
        settings: Arc<dyn SystemSettingStore>,
        storages: Arc<dyn StorageRegistry>,
        connector: Arc<dyn ObjectStorageConnector>,
        local: Arc<dyn AttachmentStorage>,
    ) -> Self {
        Self {
            settings,
            storages,
            connector,
            local,
        }
    }

    async fn setting(&self, name: &str) -> Result<Option<String>, PersistError> {
        self.settings
            .get_setting(name)
            .await
            .map_err(|e| PersistError::Configuration(format!("failed to read setting {}: {:#}", name, e)))
    }

    /// 读取 `storage-service-id` 选择存储后端
    pub async fn select_backend(&self) -> Result<StorageBackend, PersistError> {
        let value = self.setting(constants::STORAGE_SERVICE_ID).await?;
        Ok(StorageBackend::from_setting(value.as_deref())?)
    }

    /// 写入内容并返回带有location的草稿
    /// 失败时不会返回半成品草稿，调用方也就不会创建元数据
    pub async fn persist(&self, blob: UploadBlob, mut draft: ResourceCreate) -> Result<ResourceCreate, PersistError> {
        let backend = self.select_backend().await?;
        draft.size_bytes = blob.len() as i64;
        debug!("Persisting {} ({} bytes) to {:?}", draft.filename, draft.size_bytes, backend);
        let filename = path_template::sanitize_filename(&draft.filename);

        let location = match backend {
            StorageBackend::Database => {
                let content = blob.into_bytes().await.map_err(PersistError::Io)?;
                ResourceLocation::Inline(content)
            }
            StorageBackend::LocalFilesystem => {
                let value = self.setting(constants::LOCAL_STORAGE_PATH).await?;
                let template = setting::local_storage_path(value.as_deref())
                    .map_err(|e| PersistError::Configuration(format!("invalid local storage path: {}", e)))?;
                let path = path_template::resolve(&template, &filename, Utc::now());

                let mut reader = blob.into_reader().await.map_err(PersistError::Io)?;
                self.local.save(&path, &mut *reader).await.map_err(PersistError::Io)?;
                info!("Saved resource {} to local path {}", draft.filename, path);
                ResourceLocation::LocalPath(path)
            }
            StorageBackend::RemoteObjectStorage(id) => {
                let storage = self
                    .storages
                    .get_storage(id)
                    .await
                    .map_err(|e| PersistError::Configuration(format!("failed to load storage {}: {:#}", id, e)))?
                    .ok_or(StorageConfigError::NotFound(id))?;
                let config = storage.s3_config()?;
                let client = self.connector.connect(&config).map_err(PersistError::Upload)?;

                let key = path_template::resolve(&config.path, &filename, Utc::now());
                let content = blob.into_bytes().await.map_err(PersistError::Io)?;
                let uploaded = client
                    .upload_file(&key, &draft.mime_type, Bytes::from(content))
                    .await
                    .map_err(PersistError::Upload)?;

                // 文件名与对象键的最后一段保持一致
                if let Some(name) = uploaded.key.rsplit('/').next().filter(|name| !name.is_empty()) {
                    draft.filename = name.to_string();
                }
                info!("Uploaded resource {} to storage {} as {}", draft.filename, storage.name, uploaded.key);
                ResourceLocation::ExternalLink(uploaded.url)
            }
        };

        draft.location = Some(location);
        Ok(draft)
    }
}
