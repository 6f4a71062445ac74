pub mod favorite_store;
pub mod loan_store;
pub mod waitlist_store;

use crate::ports::StoreError;

// パブリックに型を再エクスポート
pub use favorite_store::FavoriteStore as PostgresFavoriteStore;
pub use loan_store::LoanStore as PostgresLoanStore;
pub use waitlist_store::WaitlistStore as PostgresWaitlistStore;

/// sqlxのエラーをストアポートのエラーに変換する
///
/// 一意制約違反（SQLSTATE 23505）は制約名つきの `Conflict` にする。
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return StoreError::Conflict(
                    db_err.constraint().unwrap_or("unique_violation").to_string(),
                );
            }
        }
        StoreError::Backend(Box::new(err))
    }
}

/// 不正な列値をデコードエラーとして扱う
pub(crate) fn invalid_data(message: String) -> StoreError {
    StoreError::backend(std::io::Error::new(
        std::io::ErrorKind::InvalidData,
        message,
    ))
}
