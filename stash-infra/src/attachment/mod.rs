pub mod s3;
pub mod storage;

pub use s3::{S3ObjectStorageClient, S3ObjectStorageConnector};
pub use storage::LocalAttachmentStorage;

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncRead;

/// 附件存储trait
/// 路径均为使用 `/` 分隔的相对路径（也接受绝对路径）
#[async_trait]
pub trait AttachmentStorage: Send + Sync {
    /// 解析为文件系统上的绝对路径
    fn resolve(&self, path: &str) -> anyhow::Result<PathBuf>;

    /// 保存文件，返回写入的字节数
    async fn save(&self, path: &str, content: &mut (dyn AsyncRead + Send + Unpin)) -> anyhow::Result<u64>;

    /// 读取文件
    async fn read(&self, path: &str) -> anyhow::Result<Vec<u8>>;

    /// 删除文件
    async fn delete(&self, path: &str) -> anyhow::Result<()>;

    /// 检查文件是否存在
    async fn exists(&self, path: &str) -> bool;
}
