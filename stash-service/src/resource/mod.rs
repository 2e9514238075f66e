pub mod delivery;
pub mod path_template;
pub mod persister;
pub mod thumbnail;
pub mod upload;

pub use delivery::{check_visibility, Delivery, ResourceContent, ResourceDeliveryService, TransferMode};
pub use persister::BlobPersister;
pub use thumbnail::{ConcurrencyGate, DefaultThumbnailService, ThumbnailService};
pub use upload::UploadBlob;

use serde::Deserialize;
use stash_api::{AuthenticatedUser, SystemSettingStore};
use stash_domain::setting::{self, constants, MEBIBYTE};
use stash_domain::{FindResource, Resource, ResourceCreate, ResourceLocation, ResourcePatch, ResourceStore};
use stash_infra::AttachmentStorage;
use std::sync::Arc;
use tracing::{info, warn};
use url::Url;

use crate::error::ResourceError;

/// 上传内容在内存中缓冲的默认上限，超过后转存到临时文件
pub const DEFAULT_UPLOAD_BUFFER_BYTES: usize = 32 * 1024 * 1024;

/// 创建外部链接资源的请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateResourceRequest {
    pub filename: String,
    pub external_link: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// 下载链接内容并保存到当前存储后端
    pub download_to_local: bool,
    pub note_id: Option<i32>,
}

/// 更新资源的请求
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateResourceRequest {
    pub filename: Option<String>,
    pub note_id: Option<i32>,
}

/// 资源管理服务
pub struct ResourceService {
    resources: Arc<dyn ResourceStore>,
    settings: Arc<dyn SystemSettingStore>,
    persister: BlobPersister,
    local: Arc<dyn AttachmentStorage>,
    thumbnails: Arc<dyn ThumbnailService>,
    http: reqwest::Client,
    upload_buffer_bytes: usize,
}

impl ResourceService {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        settings: Arc<dyn SystemSettingStore>,
        persister: BlobPersister,
        local: Arc<dyn AttachmentStorage>,
        thumbnails: Arc<dyn ThumbnailService>,
    ) -> Self {
        Self {
            resources,
            settings,
            persister,
            local,
            thumbnails,
            http: reqwest::Client::new(),
            upload_buffer_bytes: DEFAULT_UPLOAD_BUFFER_BYTES,
        }
    }

    pub fn with_upload_buffer_bytes(mut self, bytes: usize) -> Self {
        self.upload_buffer_bytes = bytes;
        self
    }

    /// 创建一个新的上传缓冲区
    pub fn new_blob(&self) -> UploadBlob {
        UploadBlob::new(self.upload_buffer_bytes)
    }

    /// 读取 `max-upload-size-mib`，返回允许的最大上传字节数
    pub async fn max_upload_size_bytes(&self) -> u64 {
        let mib = match self.settings.get_setting(constants::MAX_UPLOAD_SIZE_MIB).await {
            Ok(Some(value)) => setting::max_upload_size_mib(&value).unwrap_or_else(|| {
                warn!("Failed to parse max upload size setting: {}", value);
                constants::DEFAULT_MAX_UPLOAD_SIZE_MIB
            }),
            Ok(None) => constants::DEFAULT_MAX_UPLOAD_SIZE_MIB,
            Err(e) => {
                warn!("Failed to read max upload size setting: {:#}", e);
                constants::DEFAULT_MAX_UPLOAD_SIZE_MIB
            }
        };
        mib.saturating_mul(MEBIBYTE)
    }

    /// 超过上限时返回的错误
    pub fn size_exceeded(limit_bytes: u64) -> ResourceError {
        ResourceError::InvalidArgument(format!(
            "File size exceeds allowed limit of {} MiB",
            limit_bytes / MEBIBYTE
        ))
    }

    /// 上传文件内容并创建资源
    pub async fn upload(
        &self,
        user: &AuthenticatedUser,
        filename: &str,
        mime_type: Option<&str>,
        blob: UploadBlob,
        note_id: Option<i32>,
    ) -> Result<Resource, ResourceError> {
        let filename = filename.trim();
        if filename.is_empty() {
            return Err(ResourceError::InvalidArgument("Upload file not found".to_string()));
        }

        let limit = self.max_upload_size_bytes().await;
        if blob.len() > limit {
            return Err(Self::size_exceeded(limit));
        }

        let mime_type = match mime_type.map(str::trim).filter(|t| !t.is_empty()) {
            Some(mime_type) => mime_type.to_string(),
            None => mime_guess::from_path(filename).first_or_octet_stream().to_string(),
        };

        let mut draft = ResourceCreate::new(user.id, filename, mime_type);
        draft.note_id = note_id;
        self.save(blob, draft).await
    }

    /// 创建外部链接资源，可选地把链接内容下载到当前存储后端
    pub async fn create(&self, user: &AuthenticatedUser, request: CreateResourceRequest) -> Result<Resource, ResourceError> {
        let link = Url::parse(request.external_link.trim())
            .map_err(|_| ResourceError::InvalidArgument("Invalid external link".to_string()))?;
        if link.scheme() != "http" && link.scheme() != "https" {
            return Err(ResourceError::InvalidArgument("Invalid external link scheme".to_string()));
        }

        if request.download_to_local {
            return self.download(user, &link, request.note_id).await;
        }

        let mut create = ResourceCreate::new(user.id, request.filename, request.mime_type);
        create.location = Some(ResourceLocation::ExternalLink(link.to_string()));
        create.note_id = request.note_id;
        let resource = self.resources.create_resource(create).await?;
        info!("Created external resource {} for user {}", resource.id, user.username);
        Ok(resource)
    }

    async fn download(&self, user: &AuthenticatedUser, link: &Url, note_id: Option<i32>) -> Result<Resource, ResourceError> {
        let failed = |what: &str| ResourceError::InvalidArgument(format!("Failed to {} {}", what, link));

        let response = self
            .http
            .get(link.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|_| failed("request"))?;

        let mime_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| failed("read mime from"))?;

        let limit = self.max_upload_size_bytes().await;
        let content = response.bytes().await.map_err(|_| failed("read"))?;
        if content.len() as u64 > limit {
            return Err(Self::size_exceeded(limit));
        }

        let filename = filename_from_link(link, &mime_type);
        let mut draft = ResourceCreate::new(user.id, filename, mime_type);
        draft.note_id = note_id;
        self.save(UploadBlob::from_bytes(content.to_vec()), draft).await
    }

    async fn save(&self, blob: UploadBlob, draft: ResourceCreate) -> Result<Resource, ResourceError> {
        let create = self.persister.persist(blob, draft).await?;
        let kind = create.location.as_ref().map(|l| l.kind()).unwrap_or_default();
        let resource = self.resources.create_resource(create).await?;
        info!(
            "Created resource {} ({}, {} bytes, {})",
            resource.id, resource.filename, resource.size_bytes, kind
        );
        Ok(resource)
    }

    /// 列出用户的资源，按创建时间倒序
    pub async fn list(
        &self,
        user: &AuthenticatedUser,
        limit: Option<usize>,
        offset: Option<usize>,
    ) -> Result<Vec<Resource>, ResourceError> {
        Ok(self
            .resources
            .list_resources(&FindResource {
                creator_id: Some(user.id),
                limit,
                offset,
                ..Default::default()
            })
            .await?)
    }

    /// 更新资源，只有创建者可以修改
    pub async fn update(
        &self,
        user: &AuthenticatedUser,
        id: i32,
        request: UpdateResourceRequest,
    ) -> Result<Resource, ResourceError> {
        let resource = self
            .resources
            .find_resource(&FindResource {
                id: Some(id),
                ..Default::default()
            })
            .await?
            .ok_or(ResourceError::NotFound)?;
        if !user.is(resource.creator_id) {
            return Err(ResourceError::Unauthorized);
        }

        let mut patch = ResourcePatch::new(id);
        patch.filename = request.filename.filter(|f| !f.trim().is_empty());
        patch.note_id = request.note_id;
        let updated = self.resources.update_resource(patch).await?;

        // 缩略图缓存按扩展名命名，扩展名变化后旧缓存不会再被找到
        if updated.extension() != resource.extension() {
            self.remove_thumbnail(resource.id, resource.extension()).await;
        }
        Ok(updated)
    }

    async fn remove_thumbnail(&self, id: i32, extension: &str) {
        let thumbnail = self.thumbnails.cache_path(id, extension);
        match tokio::fs::remove_file(&thumbnail).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to delete thumbnail {}: {}", thumbnail.display(), e),
        }
    }

    /// 删除资源及其本地文件和缩略图缓存
    pub async fn delete(&self, user: &AuthenticatedUser, id: i32) -> Result<(), ResourceError> {
        let resource = self
            .resources
            .find_resource(&FindResource {
                id: Some(id),
                creator_id: Some(user.id),
                ..Default::default()
            })
            .await?
            .ok_or(ResourceError::NotFound)?;

        if let Some(path) = resource.location.local_path() {
            if let Err(e) = self.local.delete(path).await {
                warn!("Failed to delete local file {}: {:#}", path, e);
            }
        }

        self.remove_thumbnail(resource.id, resource.extension()).await;

        self.resources.delete_resource(resource.id).await?;
        info!("Deleted resource {} of user {}", resource.id, user.username);
        Ok(())
    }
}

/// 使用链接路径的最后一段作为文件名，没有扩展名时按媒体类型补全
fn filename_from_link(link: &Url, mime_type: &str) -> String {
    let mut filename = link
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|s| !s.is_empty())
        .unwrap_or("download")
        .to_string();

    if !filename.contains('.') {
        if let Some(extension) = mime_guess::get_mime_extensions_str(mime_type).and_then(|e| e.first()) {
            filename.push('.');
            filename.push_str(extension);
        }
    }
    filename
}
