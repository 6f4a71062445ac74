use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, UserId, WaitlistEntryId};

/// 予約待ちエントリ - 貸出中の書籍を待っていることを表す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub id: WaitlistEntryId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub created_at: DateTime<Utc>,
}

/// 純粋関数：予約待ちエントリを作成する
///
/// 書籍が貸出中であることの確認はアプリケーション層で行う。
pub fn enqueue(user_id: UserId, book_id: BookId, created_at: DateTime<Utc>) -> WaitlistEntry {
    WaitlistEntry {
        id: WaitlistEntryId::new(),
        user_id,
        book_id,
        created_at,
    }
}
