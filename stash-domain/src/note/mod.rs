use serde::{Deserialize, Serialize};

/// Visibility表示笔记的可见性
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Visibility {
    /// 任何人可见
    Public,
    /// 登录用户可见
    Protected,
    /// 仅创建者可见
    Private,
}

/// Note 资源所属的笔记，这里只关心可见性和创建者
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i32,
    pub creator_id: i32,
    pub visibility: Visibility,
}

impl Note {
    pub fn new(id: i32, creator_id: i32, visibility: Visibility) -> Self {
        Self {
            id,
            creator_id,
            visibility,
        }
    }
}
