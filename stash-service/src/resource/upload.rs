use std::io::{Cursor, SeekFrom};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

/// 上传内容的缓冲区
/// 小于阈值时保存在内存中，超过阈值后转存到匿名临时文件
pub struct UploadBlob {
    buffer: Buffer,
    len: u64,
    memory_limit: usize,
}

enum Buffer {
    Memory(Vec<u8>),
    Spilled(File),
}

impl UploadBlob {
    pub fn new(memory_limit: usize) -> Self {
        Self {
            buffer: Buffer::Memory(Vec::new()),
            len: 0,
            memory_limit,
        }
    }

    /// 直接使用已有的内容
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        let bytes = bytes.into();
        Self {
            len: bytes.len() as u64,
            memory_limit: bytes.len(),
            buffer: Buffer::Memory(bytes),
        }
    }

    /// 追加一段内容
    pub async fn push(&mut self, chunk: &[u8]) -> anyhow::Result<()> {
        if let Buffer::Memory(memory) = &mut self.buffer {
            if memory.len() + chunk.len() <= self.memory_limit {
                memory.extend_from_slice(chunk);
                self.len += chunk.len() as u64;
                return Ok(());
            }

            let temp = tokio::task::spawn_blocking(tempfile::tempfile).await??;
            let mut file = File::from_std(temp);
            file.write_all(memory).await?;
            self.buffer = Buffer::Spilled(file);
        }

        if let Buffer::Spilled(file) = &mut self.buffer {
            file.write_all(chunk).await?;
        }
        self.len += chunk.len() as u64;
        Ok(())
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_spilled(&self) -> bool {
        matches!(self.buffer, Buffer::Spilled(_))
    }

    /// 从头读取全部内容
    pub async fn into_reader(self) -> anyhow::Result<Box<dyn AsyncRead + Send + Unpin>> {
        match self.buffer {
            Buffer::Memory(memory) => Ok(Box::new(Cursor::new(memory))),
            Buffer::Spilled(mut file) => {
                file.flush().await?;
                file.seek(SeekFrom::Start(0)).await?;
                Ok(Box::new(file))
            }
        }
    }

    pub async fn into_bytes(self) -> anyhow::Result<Vec<u8>> {
        match self.buffer {
            Buffer::Memory(memory) => Ok(memory),
            Buffer::Spilled(_) => {
                let mut bytes = Vec::with_capacity(self.len as usize);
                self.into_reader().await?.read_to_end(&mut bytes).await?;
                Ok(bytes)
            }
        }
    }
}

impl std::fmt::Debug for UploadBlob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadBlob")
            .field("len", &self.len)
            .field("spilled", &self.is_spilled())
            .finish()
    }
}
