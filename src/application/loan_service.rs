use crate::domain::{self, BookId, Loan, LoanId, LoanPolicy, UserId, WithBook};
use crate::ports::StoreError;
use chrono::Utc;

use super::ServiceDependencies;
use super::catalog_service::with_books;
use super::errors::{LibraryApplicationError, Result};

/// 利用者の貸出一覧を取得する
///
/// 各貸出は書籍情報で補完される。書籍の取得に失敗した貸出は
/// `book: None` として返し、一覧全体は失敗させない。
#[tracing::instrument(skip(deps))]
pub async fn list_loans(deps: &ServiceDependencies, user_id: UserId) -> Result<Vec<WithBook<Loan>>> {
    let loans = deps
        .loan_store
        .list_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    Ok(with_books(deps.catalog.as_ref(), loans, |loan| loan.book_id).await)
}

/// 書籍を貸し出す
///
/// ビジネスルール：
/// - 同じ利用者が同じ書籍を貸出中でないこと（DuplicateLoan）
/// - `LoanPolicy::PerBook` の場合、他の利用者が貸出中でないこと（AlreadyBorrowed）
/// - 貸出期間は14日間
///
/// # 一貫性保証
///
/// 確認と保存はそれぞれ独立した往復で、原子性はない。
/// 同時に呼ばれた場合の重複はストア側の一意制約（PerBookでは書籍単位の
/// 制約も含む）で検出し、確認で見つかった場合と同じエラーとして返す。
#[tracing::instrument(skip(deps))]
pub async fn create_loan(deps: &ServiceDependencies, user_id: UserId, book_id: BookId) -> Result<Loan> {
    // 1. 同じ利用者の貸出中を確認
    let own_active = deps
        .loan_store
        .find_active_for_user(user_id, book_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    if own_active.is_some() {
        tracing::warn!("Duplicate loan rejected");
        return Err(LibraryApplicationError::DuplicateLoan);
    }

    // 2. 書籍単位の貸出中を確認（PerBookのみ）
    if deps.loan_policy == LoanPolicy::PerBook {
        let book_active = deps
            .loan_store
            .find_active_for_book(book_id)
            .await
            .map_err(LibraryApplicationError::StoreError)?;

        if book_active.is_some() {
            tracing::warn!("Book already borrowed by another user");
            return Err(LibraryApplicationError::AlreadyBorrowed);
        }
    }

    // 3. 貸出を保存
    let loan = domain::loan::borrow(user_id, book_id, Utc::now());
    let saved = match deps.loan_store.insert(&loan, deps.loan_policy).await {
        Ok(saved) => saved,
        Err(StoreError::Conflict(constraint)) => {
            tracing::warn!(%constraint, "Concurrent loan detected by store constraint");
            return Err(classify_conflict(deps, user_id, book_id).await);
        }
        Err(e) => return Err(LibraryApplicationError::StoreError(e)),
    };

    tracing::info!(loan_id = %saved.id, due_date = %saved.due_date, "Loan created");
    Ok(saved)
}

/// 書籍を返却する
///
/// ステータスを `returned` にして返却日時を記録する。返却済みの貸出に
/// 対して呼んでもステータスは変わらない。
///
/// 更新はストア側で借りた本人の行に限定される。他の利用者の貸出は
/// 存在しない貸出と同じく LoanNotFound になる。
#[tracing::instrument(skip(deps))]
pub async fn return_loan(
    deps: &ServiceDependencies,
    user_id: UserId,
    loan_id: LoanId,
) -> Result<Loan> {
    let loan = deps
        .loan_store
        .mark_returned(loan_id, user_id, Utc::now())
        .await
        .map_err(LibraryApplicationError::StoreError)?
        .ok_or(LibraryApplicationError::LoanNotFound)?;

    tracing::info!("Loan returned");
    Ok(loan)
}

/// 一意制約違反の原因を判定する
///
/// 同時実行で先に保存された貸出が自分のものなら DuplicateLoan、
/// それ以外は AlreadyBorrowed とする。
async fn classify_conflict(
    deps: &ServiceDependencies,
    user_id: UserId,
    book_id: BookId,
) -> LibraryApplicationError {
    match deps.loan_store.find_active_for_user(user_id, book_id).await {
        Ok(Some(_)) => LibraryApplicationError::DuplicateLoan,
        Ok(None) => match deps.loan_policy {
            LoanPolicy::PerBook => LibraryApplicationError::AlreadyBorrowed,
            LoanPolicy::PerUser => LibraryApplicationError::DuplicateLoan,
        },
        Err(e) => LibraryApplicationError::StoreError(e),
    }
}
