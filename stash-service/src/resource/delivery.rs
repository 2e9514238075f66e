use stash_api::AuthenticatedUser;
use stash_domain::{FindResource, Note, NoteStore, Resource, ResourceLocation, ResourceStore, Visibility};
use stash_infra::AttachmentStorage;
use std::sync::Arc;
use tracing::{debug, warn};

use super::thumbnail::ThumbnailService;
use crate::error::ResourceError;

/// 文本类资源统一按纯文本返回，避免被浏览器当作页面执行
pub const PLAIN_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 内容的传输方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// 一次性返回完整内容
    Full,
    /// 支持Range请求（音频、视频）
    Ranged,
}

/// 准备好返回给客户端的资源内容
#[derive(Debug)]
pub struct ResourceContent {
    pub resource: Resource,
    pub blob: Vec<u8>,
    pub content_type: String,
    pub mode: TransferMode,
}

/// 资源交付结果
#[derive(Debug)]
pub enum Delivery {
    Content(ResourceContent),
    /// 外部链接资源，重定向到原始地址
    Redirect(String),
}

/// 检查访问者能否查看资源
/// 资源没有关联笔记、笔记不存在或笔记公开时不做限制
pub fn check_visibility(note: Option<&Note>, viewer: Option<&AuthenticatedUser>) -> Result<(), ResourceError> {
    let Some(note) = note else {
        return Ok(());
    };

    match (note.visibility, viewer) {
        (Visibility::Public, _) => Ok(()),
        (_, None) => Err(ResourceError::Unauthorized),
        (Visibility::Private, Some(user)) if !user.is(note.creator_id) => Err(ResourceError::Unauthorized),
        _ => Ok(()),
    }
}

/// 根据媒体类型决定响应的Content-Type与传输方式
pub fn content_type_and_mode(mime_type: &str) -> (String, TransferMode) {
    let lowered = mime_type.to_ascii_lowercase();
    if lowered.starts_with("text/") {
        (PLAIN_TEXT_CONTENT_TYPE.to_string(), TransferMode::Full)
    } else if lowered.starts_with("video/") || lowered.starts_with("audio/") {
        (mime_type.to_string(), TransferMode::Ranged)
    } else if mime_type.is_empty() {
        (DEFAULT_CONTENT_TYPE.to_string(), TransferMode::Full)
    } else {
        (mime_type.to_string(), TransferMode::Full)
    }
}

/// 资源交付服务
pub struct ResourceDeliveryService {
    resources: Arc<dyn ResourceStore>,
    notes: Arc<dyn NoteStore>,
    local: Arc<dyn AttachmentStorage>,
    thumbnails: Arc<dyn ThumbnailService>,
}

impl ResourceDeliveryService {
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        notes: Arc<dyn NoteStore>,
        local: Arc<dyn AttachmentStorage>,
        thumbnails: Arc<dyn ThumbnailService>,
    ) -> Self {
        Self {
            resources,
            notes,
            local,
            thumbnails,
        }
    }

    /// 获取资源内容
    pub async fn deliver(
        &self,
        id: i32,
        viewer: Option<&AuthenticatedUser>,
        wants_thumbnail: bool,
    ) -> Result<Delivery, ResourceError> {
        let resource = self
            .resources
            .find_resource(&FindResource {
                id: Some(id),
                ..Default::default()
            })
            .await?
            .ok_or(ResourceError::NotFound)?;

        if let Some(note_id) = resource.note_id {
            let note = self.notes.get_note(note_id).await?;
            check_visibility(note.as_ref(), viewer)?;
        }

        let blob = match &resource.location {
            ResourceLocation::ExternalLink(url) => return Ok(Delivery::Redirect(url.clone())),
            ResourceLocation::Inline(blob) => blob.clone(),
            ResourceLocation::LocalPath(path) => self.local.read(path).await.map_err(ResourceError::Io)?,
        };

        let blob = if wants_thumbnail && self.thumbnails.is_thumbnailable(&resource.mime_type) {
            self.thumbnail_or_original(&resource, blob).await?
        } else {
            blob
        };

        let (content_type, mode) = content_type_and_mode(&resource.mime_type);
        debug!("Delivering resource {} as {} ({:?})", resource.id, content_type, mode);
        Ok(Delivery::Content(ResourceContent {
            resource,
            blob,
            content_type,
            mode,
        }))
    }

    /// 缩略图获取失败时退回原始内容
    async fn thumbnail_or_original(&self, resource: &Resource, blob: Vec<u8>) -> Result<Vec<u8>, ResourceError> {
        let destination = self.thumbnails.cache_path(resource.id, resource.extension());
        let thumbnails = self.thumbnails.clone();
        let path = destination.clone();

        let (blob, generated) = tokio::task::spawn_blocking(move || {
            let generated = thumbnails.get_or_generate(&blob, &path);
            (blob, generated)
        })
        .await
        .map_err(|e| ResourceError::Internal(e.into()))?;

        match generated {
            Ok(thumbnail) => Ok(thumbnail),
            Err(e) => {
                warn!("Failed to get or generate thumbnail {}: {}", destination.display(), e);
                Ok(blob)
            }
        }
    }
}
