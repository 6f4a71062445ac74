use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, FavoriteId, UserId};

/// お気に入り - 行が存在すること自体が「お気に入り登録済み」を意味する
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Favorite {
    pub id: FavoriteId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub created_at: DateTime<Utc>,
}

/// 純粋関数：お気に入りを作成する
pub fn favorite(user_id: UserId, book_id: BookId, created_at: DateTime<Utc>) -> Favorite {
    Favorite {
        id: FavoriteId::new(),
        user_id,
        book_id,
        created_at,
    }
}

/// お気に入りトグルの結果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "favorite", rename_all = "lowercase")]
pub enum FavoriteToggle {
    /// 新しく登録された
    Added(Favorite),
    /// 既存の行が削除された
    Removed(Favorite),
}

impl FavoriteToggle {
    /// トグル後にお気に入り状態か
    pub fn is_favorited(&self) -> bool {
        matches!(self, FavoriteToggle::Added(_))
    }

    pub fn favorite(&self) -> &Favorite {
        match self {
            FavoriteToggle::Added(f) | FavoriteToggle::Removed(f) => f,
        }
    }
}
