use async_trait::async_trait;

use crate::note::Note;
use crate::resource::{FindResource, Resource, ResourceCreate, ResourcePatch};
use crate::storage::ObjectStorage;

/// 资源元数据存储
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// 创建资源，草稿必须已经设置了location
    async fn create_resource(&self, create: ResourceCreate) -> anyhow::Result<Resource>;

    /// 按条件查询资源，按创建时间倒序
    async fn list_resources(&self, find: &FindResource) -> anyhow::Result<Vec<Resource>>;

    /// 查询单个资源
    async fn find_resource(&self, find: &FindResource) -> anyhow::Result<Option<Resource>> {
        Ok(self.list_resources(find).await?.into_iter().next())
    }

    /// 更新资源
    async fn update_resource(&self, patch: ResourcePatch) -> anyhow::Result<Resource>;

    /// 删除资源
    async fn delete_resource(&self, id: i32) -> anyhow::Result<()>;
}

/// 笔记存储，仅用于可见性判断
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn get_note(&self, id: i32) -> anyhow::Result<Option<Note>>;
}

/// 远程存储注册表
#[async_trait]
pub trait StorageRegistry: Send + Sync {
    async fn get_storage(&self, id: i32) -> anyhow::Result<Option<ObjectStorage>>;
}
