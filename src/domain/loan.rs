use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::{BookId, LoanId, LoanStatus, UserId};

/// 貸出期間（日数）
pub const LOAN_PERIOD_DAYS: i64 = 14;

/// 貸出の一意性ポリシー
///
/// - `PerBook`: 1冊の書籍に対して貸出中は全体で1件まで
/// - `PerUser`: 同じ利用者・同じ書籍の貸出中は1件まで（他の利用者は同時に借りられる）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanPolicy {
    #[default]
    PerBook,
    PerUser,
}

/// 貸出 - 1冊の書籍の1回の貸出
///
/// 返却は行を削除せず、ステータスを `returned` に変えて履歴として残す。
/// 再貸出は常に新しい行になる。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    pub fn is_held_by(&self, user_id: UserId) -> bool {
        self.is_active() && self.user_id == user_id
    }
}

/// 純粋関数：書籍を貸し出す
///
/// ビジネスルール：
/// - 貸出期間は14日間
/// - 状態はActive
///
/// 副作用なし。重複チェックはアプリケーション層の責務。
pub fn borrow(user_id: UserId, book_id: BookId, borrowed_at: DateTime<Utc>) -> Loan {
    Loan {
        id: LoanId::new(),
        user_id,
        book_id,
        borrowed_at,
        due_date: borrowed_at + Duration::days(LOAN_PERIOD_DAYS),
        returned_at: None,
        status: LoanStatus::Active,
    }
}

/// 純粋関数：書籍を返却する
///
/// 返却済みの貸出に適用してもステータスは `returned` のまま（返却日時は上書き）。
pub fn mark_returned(loan: &Loan, returned_at: DateTime<Utc>) -> Loan {
    Loan {
        status: LoanStatus::Returned,
        returned_at: Some(returned_at),
        ..loan.clone()
    }
}
