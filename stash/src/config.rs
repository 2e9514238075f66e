use serde::{Deserialize, Serialize};
use stash_domain::ObjectStorage;
use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub stash: StashConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8081,
            host: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StashConfig {
    /// 数据目录，本地文件和缩略图缓存都在其中
    pub data_dir: PathBuf,
    pub security: SecurityConfig,
    pub thumbnail: ThumbnailConfig,
    pub upload: UploadConfig,
    /// 启动时写入的系统设置，值为JSON编码
    pub settings: HashMap<String, String>,
    /// 启动时注册的远程存储
    pub storages: Vec<ObjectStorage>,
}

impl Default for StashConfig {
    fn default() -> Self {
        Self {
            data_dir: default_work_dir(),
            security: SecurityConfig::default(),
            thumbnail: ThumbnailConfig::default(),
            upload: UploadConfig::default(),
            settings: HashMap::new(),
            storages: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    pub jwt_secret: String,
    pub jwt_issuer: String,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "change-me-in-production".to_string(),
            jwt_issuer: "stash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// 同时生成缩略图的上限
    pub max_concurrency: usize,
    pub width: u32,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 32,
            width: 512,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// 上传内容在内存中缓冲的上限（MiB），与最大上传大小无关
    pub buffer_size_mib: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self { buffer_size_mib: 32 }
    }
}

fn default_work_dir() -> PathBuf {
    let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home_dir.join(".stash")
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path = default_work_dir().join("stash.toml");

        // 如果存在.env文件，先加载到环境变量中
        dotenv::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name("stash.toml").required(false))
            .add_source(config::File::from(config_path.as_path()).required(false))
            .add_source(config::Environment::with_prefix("STASH").separator("__"))
            .build()?;
        config.try_deserialize()
    }
}
