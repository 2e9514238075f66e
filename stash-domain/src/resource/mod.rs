use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

/// 资源内容所在的位置
/// 三者互斥：内联字节、本地相对路径、外部链接
#[derive(Clone, PartialEq, Eq)]
pub enum ResourceLocation {
    /// 内容直接与元数据存放在一起（数据库存储）
    Inline(Vec<u8>),
    /// 相对于数据目录的本地路径（使用 `/` 分隔）
    LocalPath(String),
    /// 由第三方存储和提供的链接，引擎从不读取其内容
    ExternalLink(String),
}

impl ResourceLocation {
    pub fn external_link(&self) -> Option<&str> {
        match self {
            ResourceLocation::ExternalLink(url) => Some(url),
            _ => None,
        }
    }

    pub fn local_path(&self) -> Option<&str> {
        match self {
            ResourceLocation::LocalPath(path) => Some(path),
            _ => None,
        }
    }

    /// 存储方式的名称，用于日志
    pub fn kind(&self) -> &'static str {
        match self {
            ResourceLocation::Inline(_) => "inline",
            ResourceLocation::LocalPath(_) => "local",
            ResourceLocation::ExternalLink(_) => "external",
        }
    }
}

// 内联内容可能很大，Debug只输出长度
impl std::fmt::Debug for ResourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceLocation::Inline(blob) => write!(f, "Inline({} bytes)", blob.len()),
            ResourceLocation::LocalPath(path) => f.debug_tuple("LocalPath").field(path).finish(),
            ResourceLocation::ExternalLink(url) => f.debug_tuple("ExternalLink").field(url).finish(),
        }
    }
}

/// Resource 表示一个已存储的附件
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: i32,
    pub creator_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub filename: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    #[serde(rename = "size")]
    pub size_bytes: i64,
    /// 对外只暴露外部链接，内联内容和本地路径不出现在响应中
    #[serde(rename = "externalLink", serialize_with = "serialize_external_link")]
    pub location: ResourceLocation,
    /// 所属笔记，仅用于可见性判断
    pub note_id: Option<i32>,
}

fn serialize_external_link<S: Serializer>(location: &ResourceLocation, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(location.external_link().unwrap_or_default())
}

impl Resource {
    /// 文件扩展名（包含前导的 `.`），没有扩展名时返回空串
    pub fn extension(&self) -> &str {
        match self.filename.rfind('.') {
            Some(index) if !self.filename[index..].contains('/') => &self.filename[index..],
            _ => "",
        }
    }
}

/// 创建资源的草稿
/// `location` 只有在底层写入成功之后才会被设置
#[derive(Debug, Clone, Default)]
pub struct ResourceCreate {
    pub creator_id: i32,
    pub filename: String,
    pub mime_type: String,
    pub size_bytes: i64,
    pub location: Option<ResourceLocation>,
    pub note_id: Option<i32>,
}

impl ResourceCreate {
    pub fn new(creator_id: i32, filename: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            creator_id,
            filename: filename.into(),
            mime_type: mime_type.into(),
            ..Default::default()
        }
    }
}

/// 资源查询条件
#[derive(Debug, Clone, Default)]
pub struct FindResource {
    pub id: Option<i32>,
    pub creator_id: Option<i32>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// 资源更新
#[derive(Debug, Clone)]
pub struct ResourcePatch {
    pub id: i32,
    pub updated_at: DateTime<Utc>,
    pub filename: Option<String>,
    pub note_id: Option<i32>,
}

impl ResourcePatch {
    pub fn new(id: i32) -> Self {
        Self {
            id,
            updated_at: Utc::now(),
            filename: None,
            note_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resource(filename: &str, location: ResourceLocation) -> Resource {
        Resource {
            id: 1,
            creator_id: 1,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            filename: filename.to_string(),
            mime_type: "image/png".to_string(),
            size_bytes: 3,
            location,
            note_id: None,
        }
    }

    #[test]
    fn test_extension() {
        assert_eq!(resource("cat.png", ResourceLocation::Inline(vec![])).extension(), ".png");
        assert_eq!(resource("archive.tar.gz", ResourceLocation::Inline(vec![])).extension(), ".gz");
        assert_eq!(resource("README", ResourceLocation::Inline(vec![])).extension(), "");
    }

    #[test]
    fn test_serialize_hides_blob_and_path() {
        let inline = serde_json::to_value(resource("a.png", ResourceLocation::Inline(vec![1, 2, 3]))).unwrap();
        assert_eq!(inline["externalLink"], "");
        assert_eq!(inline["type"], "image/png");
        assert_eq!(inline["size"], 3);

        let local = serde_json::to_value(resource("a.png", ResourceLocation::LocalPath("assets/a.png".into()))).unwrap();
        assert!(!local.to_string().contains("assets/a.png"));

        let external = serde_json::to_value(resource(
            "a.png",
            ResourceLocation::ExternalLink("https://cdn.example.com/a.png".into()),
        ))
        .unwrap();
        assert_eq!(external["externalLink"], "https://cdn.example.com/a.png");
    }

    #[test]
    fn test_debug_does_not_dump_blob() {
        let location = ResourceLocation::Inline(vec![0; 1024]);
        assert_eq!(format!("{:?}", location), "Inline(1024 bytes)");
    }
}
