use async_trait::async_trait;
use stash_domain::{ObjectStorage, StorageRegistry};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 内存中的远程存储注册表
#[derive(Default)]
pub struct MemoryStorageRegistry {
    storages: RwLock<HashMap<i32, ObjectStorage>>,
}

impl MemoryStorageRegistry {
    pub fn new(storages: impl IntoIterator<Item = ObjectStorage>) -> Self {
        Self {
            storages: RwLock::new(storages.into_iter().map(|s| (s.id, s)).collect()),
        }
    }

    pub async fn register(&self, storage: ObjectStorage) {
        self.storages.write().await.insert(storage.id, storage);
    }
}

#[async_trait]
impl StorageRegistry for MemoryStorageRegistry {
    async fn get_storage(&self, id: i32) -> anyhow::Result<Option<ObjectStorage>> {
        Ok(self.storages.read().await.get(&id).cloned())
    }
}
