use async_trait::async_trait;

/// 系统设置存储
/// 值以JSON字符串形式保存，解析由调用方负责
#[async_trait]
pub trait SystemSettingStore: Send + Sync {
    /// 读取设置的原始值，不存在时返回None
    async fn get_setting(&self, name: &str) -> anyhow::Result<Option<String>>;

    /// 写入设置（覆盖旧值）
    async fn set_setting(&self, name: &str, value: String) -> anyhow::Result<()>;
}
