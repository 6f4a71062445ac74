use crate::domain::{BookId, Loan, LoanId, LoanPolicy, UserId, loan::mark_returned};
use crate::ports::StoreError;
use crate::ports::loan_store::{LoanStore as LoanStoreTrait, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Mutex;

/// LoanStoreのインメモリ実装
///
/// PostgreSQLのスキーマと同じ一意制約を `insert` で検査する。
/// PerBookで保存した貸出は `exclusive` として記録し、書籍ごとの制約に使う。
pub struct LoanStore {
    loans: Mutex<Vec<Loan>>,
    exclusive: Mutex<HashSet<LoanId>>,
    unavailable: Mutex<bool>,
}

impl LoanStore {
    pub fn new() -> Self {
        Self {
            loans: Mutex::new(Vec::new()),
            exclusive: Mutex::new(HashSet::new()),
            unavailable: Mutex::new(false),
        }
    }

    /// 保存されている全貸出
    pub fn all(&self) -> Vec<Loan> {
        self.loans.lock().unwrap().clone()
    }

    /// 以降の操作をすべて失敗させる
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.lock().unwrap() = unavailable;
    }

    fn check_available(&self) -> Result<()> {
        if *self.unavailable.lock().unwrap() {
            return Err(StoreError::backend("loan store unavailable"));
        }
        Ok(())
    }
}

impl Default for LoanStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LoanStoreTrait for LoanStore {
    async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Loan>> {
        self.check_available()?;
        let mut loans: Vec<Loan> = self
            .loans
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.user_id == user_id)
            .cloned()
            .collect();
        loans.sort_by(|a, b| b.borrowed_at.cmp(&a.borrowed_at));
        Ok(loans)
    }

    async fn find_active_for_user(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<Option<Loan>> {
        self.check_available()?;
        Ok(self
            .loans
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.is_held_by(user_id) && l.book_id == book_id)
            .cloned())
    }

    async fn find_active_for_book(&self, book_id: BookId) -> Result<Option<Loan>> {
        self.check_available()?;
        Ok(self
            .loans
            .lock()
            .unwrap()
            .iter()
            .find(|l| l.is_active() && l.book_id == book_id)
            .cloned())
    }

    async fn insert(&self, loan: &Loan, policy: LoanPolicy) -> Result<Loan> {
        self.check_available()?;
        let mut loans = self.loans.lock().unwrap();
        let mut exclusive = self.exclusive.lock().unwrap();

        if loan.is_active() {
            let duplicate = loans
                .iter()
                .any(|l| l.is_held_by(loan.user_id) && l.book_id == loan.book_id);
            if duplicate {
                return Err(StoreError::Conflict(
                    "loans_one_active_per_user_book".to_string(),
                ));
            }

            let book_taken = policy == LoanPolicy::PerBook
                && loans.iter().any(|l| {
                    l.is_active() && l.book_id == loan.book_id && exclusive.contains(&l.id)
                });
            if book_taken {
                return Err(StoreError::Conflict("loans_one_active_per_book".to_string()));
            }
        }

        if policy == LoanPolicy::PerBook {
            exclusive.insert(loan.id);
        }
        loans.push(loan.clone());
        Ok(loan.clone())
    }

    async fn mark_returned(
        &self,
        loan_id: LoanId,
        user_id: UserId,
        returned_at: DateTime<Utc>,
    ) -> Result<Option<Loan>> {
        self.check_available()?;
        let mut loans = self.loans.lock().unwrap();
        let owned = loans
            .iter_mut()
            .find(|l| l.id == loan_id && l.user_id == user_id);
        Ok(owned.map(|loan| {
            *loan = mark_returned(loan, returned_at);
            loan.clone()
        }))
    }
}
