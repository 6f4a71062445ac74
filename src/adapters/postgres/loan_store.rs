use crate::domain::{BookId, Loan, LoanId, LoanPolicy, LoanStatus, UserId};
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};
use std::str::FromStr;

use super::invalid_data;

const LOAN_COLUMNS: &str = "id, user_id, book_id, borrowed_at, due_date, returned_at, status";

/// PostgreSQLの行データをLoanに変換する
///
/// statusの文字列からの変換に失敗した場合はデコードエラーとする。
fn map_row_to_loan(row: &PgRow) -> Result<Loan> {
    let status_str: &str = row.get("status");
    let status = LoanStatus::from_str(status_str).map_err(invalid_data)?;

    Ok(Loan {
        id: LoanId::from_uuid(row.get("id")),
        user_id: UserId::from_uuid(row.get("user_id")),
        book_id: BookId::new(row.get("book_id")),
        borrowed_at: row.get("borrowed_at"),
        due_date: row.get("due_date"),
        returned_at: row.get("returned_at"),
        status,
    })
}

/// LoanStoreのPostgreSQL実装
///
/// `loans` テーブルに対するフィルタ付きクエリ。貸出中の一意性は
/// 部分一意インデックスで保証される。
///
/// - `loans_one_active_per_user_book`: 利用者・書籍ごと
/// - `loans_one_active_per_book`: `exclusive` な貸出の書籍ごと（PerBookで保存した行）
pub struct LoanStore {
    pool: PgPool,
}

impl LoanStore {
    /// PostgreSQLコネクションプールから新しいLoanStoreを作成
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    /// 利用者の全貸出を取得（貸出日時の新しい順）
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        let rows = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans WHERE user_id = $1 ORDER BY borrowed_at DESC"
        ))
        .bind(user_id.value())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_loan).collect()
    }

    async fn find_active_for_user(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans \
             WHERE user_id = $1 AND book_id = $2 AND status = 'active' \
             LIMIT 1"
        ))
        .bind(user_id.value())
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    async fn find_active_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "SELECT {LOAN_COLUMNS} FROM loans \
             WHERE book_id = $1 AND status = 'active' \
             ORDER BY borrowed_at ASC \
             LIMIT 1"
        ))
        .bind(book_id.value())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }

    /// 貸出を保存し、保存された行を返す
    async fn insert(&self, loan: &Loan, policy: LoanPolicy) -> Result<Loan> {
        let row = sqlx::query(&format!(
            "INSERT INTO loans \
             (id, user_id, book_id, borrowed_at, due_date, returned_at, status, exclusive) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {LOAN_COLUMNS}"
        ))
        .bind(loan.id.value())
        .bind(loan.user_id.value())
        .bind(loan.book_id.value())
        .bind(loan.borrowed_at)
        .bind(loan.due_date)
        .bind(loan.returned_at)
        .bind(loan.status.as_str())
        .bind(policy == LoanPolicy::PerBook)
        .fetch_one(&self.pool)
        .await?;

        map_row_to_loan(&row)
    }

    /// ステータスと返却日時を更新する（借りた本人の行のみ）
    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<Loan>> {
        let row = sqlx::query(&format!(
            "UPDATE loans SET status = 'returned', returned_at = $3 \
             WHERE id = $1 AND user_id = $2 \
             RETURNING {LOAN_COLUMNS}"
        ))
        .bind(loan_id.value())
        .bind(user_id.value())
        .bind(returned_at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_row_to_loan).transpose()
    }
}
