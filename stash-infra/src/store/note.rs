use async_trait::async_trait;
use stash_domain::{Note, NoteStore};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 内存中的笔记存储
#[derive(Default)]
pub struct MemoryNoteStore {
    notes: RwLock<HashMap<i32, Note>>,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, note: Note) {
        self.notes.write().await.insert(note.id, note);
    }

    pub async fn remove(&self, id: i32) {
        self.notes.write().await.remove(&id);
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn get_note(&self, id: i32) -> anyhow::Result<Option<Note>> {
        Ok(self.notes.read().await.get(&id).cloned())
    }
}
