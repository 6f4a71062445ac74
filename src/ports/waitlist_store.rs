use crate::domain::{BookId, UserId, WaitlistEntry, WaitlistEntryId};
use async_trait::async_trait;

pub use super::store_error::Result;

/// 予約待ちテーブル（`waitlist`）ポート
#[async_trait]
pub trait WaitlistStore: Send + Sync {
    /// 利用者の全予約待ちを取得する（古い順）
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<WaitlistEntry>>;

    /// 利用者・書籍の組で予約待ちを検索する
    async fn find(&self, user_id: UserId, book_id: BookId) -> Result<Option<WaitlistEntry>>;

    /// 予約待ちを保存する
    ///
    /// 同じ利用者・書籍の行が既にある場合は `StoreError::Conflict` を返す。
    async fn insert(&self, entry: &WaitlistEntry) -> Result<WaitlistEntry>;

    /// 利用者自身の予約待ちを削除する
    ///
    /// 該当する行がなければ何もしない。
    async fn delete(&self, entry_id: WaitlistEntryId, user_id: UserId) -> Result<()>;
}
