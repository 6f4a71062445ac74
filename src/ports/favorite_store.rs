use crate::domain::{BookId, Favorite, FavoriteId, UserId};
use async_trait::async_trait;

pub use super::store_error::Result;

/// お気に入りテーブル（`favorites`）ポート
#[async_trait]
pub trait FavoriteStore: Send + Sync {
    /// 利用者の全お気に入りを取得する（新しい順）
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Favorite>>;

    /// 利用者・書籍の組でお気に入りを検索する
    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<Favorite>>;

    /// お気に入りを保存する
    ///
    /// 同じ利用者・書籍の行が既にある場合は `StoreError::Conflict` を返す。
    async fn insert(&self, favorite: &Favorite) -> Result<Favorite>;

    /// お気に入りを削除する（存在しなくてもエラーにしない）
    async fn delete(&self, favorite_id: FavoriteId) -> Result<()>;
}
