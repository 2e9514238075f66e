/// 系统设置常量
pub mod constants {
    /// 当前使用的存储服务ID
    pub const STORAGE_SERVICE_ID: &str = "storage-service-id";
    /// 本地存储的路径模板
    pub const LOCAL_STORAGE_PATH: &str = "local-storage-path";
    /// 最大上传大小（MiB）
    pub const MAX_UPLOAD_SIZE_MIB: &str = "max-upload-size-mib";

    pub const DEFAULT_LOCAL_STORAGE_PATH: &str = "assets/{timestamp}_{filename}";
    pub const DEFAULT_MAX_UPLOAD_SIZE_MIB: u64 = 32;
}

pub const MEBIBYTE: u64 = 1024 * 1024;

/// 解析本地存储路径模板（JSON字符串），空值使用默认模板
pub fn local_storage_path(value: Option<&str>) -> Result<String, serde_json::Error> {
    let path = match value.map(str::trim) {
        None | Some("") => String::new(),
        Some(raw) => serde_json::from_str::<String>(raw)?,
    };
    if path.is_empty() {
        Ok(constants::DEFAULT_LOCAL_STORAGE_PATH.to_string())
    } else {
        Ok(path)
    }
}

/// 解析最大上传大小（MiB），兼容 `32` 与 `"32"` 两种写法
pub fn max_upload_size_mib(value: &str) -> Option<u64> {
    let value = value.trim();
    let raw = serde_json::from_str::<String>(value).unwrap_or_else(|_| value.to_string());
    raw.trim().parse().ok()
}
