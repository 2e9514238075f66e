use super::AttachmentStorage;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tokio::io::{AsyncRead, AsyncWriteExt};

/// 本地文件存储实现
pub struct LocalAttachmentStorage {
    base_path: PathBuf,
}

impl LocalAttachmentStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// 构建完整文件路径
    fn build_path(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative.components().any(|c| matches!(c, Component::ParentDir)) {
            anyhow::bail!("path escapes the data directory: {}", path);
        }
        if relative.is_absolute() {
            return Ok(relative.to_path_buf());
        }
        Ok(self.base_path.join(relative))
    }

    async fn write_to(full_path: &Path, content: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        let mut file = fs::File::create(full_path).await?;
        let written = tokio::io::copy(content, &mut file).await?;
        file.flush().await?;
        file.sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl AttachmentStorage for LocalAttachmentStorage {
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        self.build_path(path)
    }

    async fn save(&self, path: &str, content: &mut (dyn AsyncRead + Send + Unpin)) -> Result<u64> {
        // 绝对路径只用于读取旧数据，写入必须在数据目录之内
        if Path::new(path).is_absolute() {
            anyhow::bail!("refusing to write outside the data directory: {}", path);
        }
        let full_path = self.build_path(path)?;

        // 创建父目录
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .context("failed to create directory")?;
        }

        match Self::write_to(&full_path, content).await {
            Ok(written) => Ok(written),
            Err(e) => {
                // 不留下写了一半的文件
                let _ = fs::remove_file(&full_path).await;
                Err(e.context("failed to write file"))
            }
        }
    }

    async fn read(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = self.build_path(path)?;
        let content = fs::read(&full_path).await?;
        Ok(content)
    }

    async fn delete(&self, path: &str) -> Result<()> {
        let full_path = self.build_path(path)?;
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, path: &str) -> bool {
        match self.build_path(path) {
            Ok(full_path) => fs::try_exists(full_path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalAttachmentStorage::new(temp_dir.path().to_path_buf());

        let written = storage
            .save("assets/2024/a.txt", &mut &b"hello"[..])
            .await
            .unwrap();
        assert_eq!(written, 5);
        assert!(temp_dir.path().join("assets/2024/a.txt").exists());
        assert!(storage.exists("assets/2024/a.txt").await);
        assert_eq!(storage.read("assets/2024/a.txt").await.unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalAttachmentStorage::new(temp_dir.path().to_path_buf());

        storage.save("a.txt", &mut &b"x"[..]).await.unwrap();
        storage.delete("a.txt").await.unwrap();
        assert!(!storage.exists("a.txt").await);
        storage.delete("a.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_parent_dir() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalAttachmentStorage::new(temp_dir.path().join("data"));

        assert!(storage.resolve("../secret").is_err());
        assert!(storage.save("assets/../../x", &mut &b"x"[..]).await.is_err());
        assert!(!storage.exists("../secret").await);
    }

    #[tokio::test]
    async fn test_save_rejects_absolute_path() {
        let temp_dir = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        let storage = LocalAttachmentStorage::new(temp_dir.path().to_path_buf());

        let target = outside.path().join("x.txt");
        let result = storage.save(&target.to_string_lossy(), &mut &b"x"[..]).await;
        assert!(result.is_err());
        assert!(!target.exists());
    }

    #[test]
    fn test_absolute_path_is_kept() {
        let storage = LocalAttachmentStorage::new(PathBuf::from("/var/lib/stash"));
        assert_eq!(storage.resolve("/srv/blob.bin").unwrap(), PathBuf::from("/srv/blob.bin"));
        assert_eq!(
            storage.resolve("assets/a.png").unwrap(),
            PathBuf::from("/var/lib/stash/assets/a.png")
        );
    }
}
