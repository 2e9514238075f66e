use async_trait::async_trait;
use chrono::Utc;
use stash_domain::{FindResource, Resource, ResourceCreate, ResourcePatch, ResourceStore};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

#[derive(Default)]
struct Inner {
    next_id: i32,
    resources: BTreeMap<i32, Resource>,
}

/// 内存中的资源元数据存储
#[derive(Default)]
pub struct MemoryResourceStore {
    inner: RwLock<Inner>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn create_resource(&self, create: ResourceCreate) -> anyhow::Result<Resource> {
        let location = create
            .location
            .ok_or_else(|| anyhow::anyhow!("resource {} has no content location", create.filename))?;

        let mut inner = self.inner.write().await;
        inner.next_id += 1;
        let now = Utc::now();
        let resource = Resource {
            id: inner.next_id,
            creator_id: create.creator_id,
            created_at: now,
            updated_at: now,
            filename: create.filename,
            mime_type: create.mime_type,
            size_bytes: create.size_bytes,
            location,
            note_id: create.note_id,
        };
        inner.resources.insert(resource.id, resource.clone());
        Ok(resource)
    }

    async fn list_resources(&self, find: &FindResource) -> anyhow::Result<Vec<Resource>> {
        let inner = self.inner.read().await;
        let mut resources: Vec<Resource> = inner
            .resources
            .values()
            .filter(|r| find.id.map_or(true, |id| r.id == id))
            .filter(|r| find.creator_id.map_or(true, |id| r.creator_id == id))
            .cloned()
            .collect();

        // 按创建时间倒序
        resources.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

        Ok(resources
            .into_iter()
            .skip(find.offset.unwrap_or(0))
            .take(find.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn update_resource(&self, patch: ResourcePatch) -> anyhow::Result<Resource> {
        let mut inner = self.inner.write().await;
        let resource = inner
            .resources
            .get_mut(&patch.id)
            .ok_or_else(|| anyhow::anyhow!("resource {} not found", patch.id))?;

        resource.updated_at = patch.updated_at;
        if let Some(filename) = patch.filename {
            resource.filename = filename;
        }
        if let Some(note_id) = patch.note_id {
            resource.note_id = Some(note_id);
        }
        Ok(resource.clone())
    }

    async fn delete_resource(&self, id: i32) -> anyhow::Result<()> {
        self.inner.write().await.resources.remove(&id);
        Ok(())
    }
}
