use crate::domain::{BookId, Loan, LoanId, LoanPolicy, UserId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use super::store_error::Result;

/// 貸出テーブル（`loans`）ポート
///
/// 各メソッドはリモートストアへの1回の往復に対応する。
/// メソッド間の原子性は保証されない。
#[async_trait]
pub trait LoanStore: Send + Sync {
    /// 利用者の全貸出を取得する（`borrowed_at` の新しい順）
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Loan>>;

    /// 利用者・書籍の組で貸出中の貸出を検索する
    async fn find_active_for_user(&self, user_id: UserId, book_id: BookId)
    -> Result<Option<Loan>>;

    /// 書籍の貸出中の貸出を検索する（利用者を問わない）
    async fn find_active_for_book(&self, book_id: BookId) -> Result<Option<Loan>>;

    /// 新しい貸出を保存する
    ///
    /// 利用者・書籍ごとの貸出中は常に1件まで。`LoanPolicy::PerBook` で保存した
    /// 貸出は書籍ごとの貸出中1件までの制約も受ける。
    /// 一意制約に違反した場合は `StoreError::Conflict` を返す。
    async fn insert(&self, loan: &Loan, policy: LoanPolicy) -> Result<Loan>;

    /// 利用者自身の貸出を返却済みにする
    ///
    /// 該当する行がない場合（他の利用者の貸出を含む）は `Ok(None)` を返す。
    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<Loan>>;
}
