use async_trait::async_trait;
use stash_api::SystemSettingStore;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// 内存中的系统设置存储
/// 启动时由配置文件中的设置初始化
#[derive(Default)]
pub struct MemorySystemSettingStore {
    settings: RwLock<HashMap<String, String>>,
}

impl MemorySystemSettingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: HashMap<String, String>) -> Self {
        Self {
            settings: RwLock::new(settings),
        }
    }
}

#[async_trait]
impl SystemSettingStore for MemorySystemSettingStore {
    async fn get_setting(&self, name: &str) -> anyhow::Result<Option<String>> {
        Ok(self.settings.read().await.get(name).cloned())
    }

    async fn set_setting(&self, name: &str, value: String) -> anyhow::Result<()> {
        self.settings.write().await.insert(name.to_string(), value);
        Ok(())
    }
}
