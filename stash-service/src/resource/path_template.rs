use chrono::{DateTime, Datelike, Timelike, Utc};
use regex::{Captures, Regex};
use std::sync::LazyLock;
use uuid::Uuid;

/// 文件名占位符
pub const FILENAME_PLACEHOLDER: &str = "{filename}";

static PLACEHOLDER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[a-z]{1,9}\}").expect("placeholder pattern is valid"));

/// 把路径模板解析为具体的相对路径
///
/// 支持的占位符：`{filename}` `{timestamp}` `{year}` `{month}` `{day}`
/// `{hour}` `{minute}` `{second}` `{uuid}`，其余 `{...}` 原样保留。
/// 模板中没有 `{filename}` 时会先追加一段 `/{filename}`，
/// 保证最后一段总是来自文件名，避免不同上传互相覆盖。
/// 替换只进行一遍，文件名中的花括号不会被再次解析。
pub fn resolve(template: &str, filename: &str, now: DateTime<Utc>) -> String {
    let template = with_filename_segment(template);

    PLACEHOLDER_PATTERN
        .replace_all(&template, |caps: &Captures| match &caps[0] {
            "{filename}" => filename.to_string(),
            "{timestamp}" => now.timestamp().to_string(),
            "{year}" => now.year().to_string(),
            "{month}" => format!("{:02}", now.month()),
            "{day}" => format!("{:02}", now.day()),
            "{hour}" => format!("{:02}", now.hour()),
            "{minute}" => format!("{:02}", now.minute()),
            "{second}" => format!("{:02}", now.second()),
            "{uuid}" => Uuid::new_v4().to_string(),
            other => other.to_string(),
        })
        .into_owned()
}

/// 上传文件名只保留最后一段，去掉目录、`..` 和根路径
/// 保证解析后的路径始终落在存储根目录之内
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .rsplit(|c| c == '/' || c == '\\')
        .map(str::trim)
        .find(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .unwrap_or("file")
        .to_string()
}

fn with_filename_segment(template: &str) -> String {
    if template.contains(FILENAME_PLACEHOLDER) {
        template.to_string()
    } else if template.is_empty() || template.ends_with('/') {
        format!("{}{}", template, FILENAME_PLACEHOLDER)
    } else {
        format!("{}/{}", template, FILENAME_PLACEHOLDER)
    }
}
