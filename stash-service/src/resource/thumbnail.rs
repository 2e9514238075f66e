use image::imageops::FilterType;
use image::{DynamicImage, ImageDecoder, ImageFormat, ImageReader};
use std::io::{BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::ThumbnailError;

/// 缩略图缓存目录（位于数据目录下）
pub const THUMBNAIL_CACHE_DIR: &str = ".thumbnail_cache";
/// 默认同时生成缩略图的数量上限
pub const DEFAULT_MAX_CONCURRENCY: usize = 32;
/// 默认缩略图宽度（像素）
pub const DEFAULT_THUMBNAIL_WIDTH: u32 = 512;

/// 支持生成缩略图的媒体类型
const THUMBNAIL_MEDIA_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

/// 缩略图生成的并发闸门
/// 只做非阻塞的 try-acquire，容量用尽时立即失败，不排队
#[derive(Clone)]
pub struct ConcurrencyGate {
    semaphore: Arc<Semaphore>,
    capacity: usize,
}

impl ConcurrencyGate {
    pub fn new(capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(capacity)),
            capacity,
        }
    }

    /// 尝试占用一个名额，permit 被丢弃时自动归还
    pub fn try_acquire(&self) -> Option<OwnedSemaphorePermit> {
        self.semaphore.clone().try_acquire_owned().ok()
    }

    pub fn available(&self) -> usize {
        self.semaphore.available_permits()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for ConcurrencyGate {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CONCURRENCY)
    }
}

/// 缩略图服务trait
pub trait ThumbnailService: Send + Sync {
    /// 获取缩略图，不存在时生成并缓存
    /// 这是阻塞调用，异步上下文中应放到 `spawn_blocking` 里执行
    fn get_or_generate(&self, source: &[u8], destination: &Path) -> Result<Vec<u8>, ThumbnailError>;

    /// 资源对应的缩略图缓存路径：`{id}{ext}`
    fn cache_path(&self, resource_id: i32, extension: &str) -> PathBuf;

    /// 检查是否为可生成缩略图的图片类型
    fn is_thumbnailable(&self, media_type: &str) -> bool {
        let media_type = media_type.to_ascii_lowercase();
        THUMBNAIL_MEDIA_TYPES.iter().any(|t| media_type.starts_with(t))
    }
}

/// 默认缩略图服务实现
/// 使用image crate进行图片处理
pub struct DefaultThumbnailService {
    cache_dir: PathBuf,
    width: u32,
    gate: ConcurrencyGate,
}

impl DefaultThumbnailService {
    pub fn new(cache_dir: PathBuf, width: u32, gate: ConcurrencyGate) -> Self {
        Self {
            cache_dir,
            width: width.max(1),
            gate,
        }
    }

    pub fn gate(&self) -> &ConcurrencyGate {
        &self.gate
    }

    fn decode(source: &[u8]) -> Result<DynamicImage, ThumbnailError> {
        let mut decoder = ImageReader::new(Cursor::new(source))
            .with_guessed_format()?
            .into_decoder()
            .map_err(ThumbnailError::Decode)?;
        let orientation = decoder.orientation().map_err(ThumbnailError::Decode)?;
        let mut image = DynamicImage::from_decoder(decoder).map_err(ThumbnailError::Decode)?;
        image.apply_orientation(orientation);
        Ok(image)
    }

    fn resize(&self, image: &DynamicImage) -> DynamicImage {
        // 按固定宽度等比缩放
        let (width, height) = (image.width().max(1) as u64, image.height() as u64);
        let target_height = ((height * self.width as u64 + width / 2) / width).max(1) as u32;
        image.resize_exact(self.width, target_height, FilterType::Lanczos3)
    }

    fn generate(&self, source: &[u8], destination: &Path) -> Result<(), ThumbnailError> {
        let format = ImageFormat::from_path(destination)
            .or_else(|_| image::guess_format(source))
            .map_err(ThumbnailError::Decode)?;

        let thumbnail = self.resize(&Self::decode(source)?);
        let thumbnail = match format {
            ImageFormat::Jpeg => DynamicImage::ImageRgb8(thumbnail.to_rgb8()),
            _ => thumbnail,
        };

        let dir = destination.parent().unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        // 先写入临时文件，再以不覆盖的方式改名，半成品不会以最终文件名出现
        let mut temp = NamedTempFile::new_in(dir)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            thumbnail
                .write_to(&mut writer, format)
                .map_err(ThumbnailError::Encode)?;
            writer.flush()?;
        }

        match temp.persist_noclobber(destination) {
            Ok(_) => Ok(()),
            // 并发请求已经生成了同一个缩略图
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(()),
            Err(e) => Err(ThumbnailError::Io(e.error)),
        }
    }
}

impl ThumbnailService for DefaultThumbnailService {
    fn get_or_generate(&self, source: &[u8], destination: &Path) -> Result<Vec<u8>, ThumbnailError> {
        match std::fs::read(destination) {
            Ok(cached) => return Ok(cached),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(ThumbnailError::Io(e)),
        }

        let permit = self.gate.try_acquire().ok_or(ThumbnailError::CapacityExceeded)?;
        let generated = self.generate(source, destination);
        drop(permit);
        generated?;

        Ok(std::fs::read(destination)?)
    }

    fn cache_path(&self, resource_id: i32, extension: &str) -> PathBuf {
        self.cache_dir.join(format!("{}{}", resource_id, extension))
    }
}
