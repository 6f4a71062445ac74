use crate::domain::{self, BookId, UserId, WaitlistEntry, WaitlistEntryId, WithBook};
use crate::ports::StoreError;
use chrono::Utc;

use super::ServiceDependencies;
use super::catalog_service::{fetch_book_best_effort, with_books};
use super::errors::{LibraryApplicationError, Result};

/// 利用者の予約待ち一覧を取得する
///
/// 補完の方針は貸出一覧と同じ。
#[tracing::instrument(skip(deps))]
pub async fn list_waitlist(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<WithBook<WaitlistEntry>>> {
    let entries = deps
        .waitlist_store
        .list_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    Ok(with_books(deps.catalog.as_ref(), entries, |entry| entry.book_id).await)
}

/// 予約待ちに登録する
///
/// ビジネスルール：
/// 1. 同じ書籍の予約待ちに未登録であること（AlreadyOnWaitlist）
/// 2. 書籍が貸出中であること（BookAvailable）
/// 3. 貸出中の利用者が自分でないこと（AlreadyHolding）
///
/// 登録後、書籍情報の補完を試みる（失敗しても登録は成功扱い）。
#[tracing::instrument(skip(deps))]
pub async fn join_waitlist(
    deps: &ServiceDependencies,
    user_id: UserId,
    book_id: BookId,
) -> Result<WithBook<WaitlistEntry>> {
    // 1. 登録済みか確認
    let existing = deps
        .waitlist_store
        .find(user_id, book_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    if existing.is_some() {
        return Err(LibraryApplicationError::AlreadyOnWaitlist);
    }

    // 2. 貸出中の貸出を確認
    let active_loan = deps
        .loan_store
        .find_active_for_book(book_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?
        .ok_or(LibraryApplicationError::BookAvailable)?;

    // 3. 自分が借りていないか確認
    if active_loan.user_id == user_id {
        return Err(LibraryApplicationError::AlreadyHolding);
    }

    // 4. 保存
    let entry = domain::waitlist::enqueue(user_id, book_id, Utc::now());
    let saved = deps
        .waitlist_store
        .insert(&entry)
        .await
        .map_err(|e| match e {
            StoreError::Conflict(_) => LibraryApplicationError::AlreadyOnWaitlist,
            other => LibraryApplicationError::StoreError(other),
        })?;

    tracing::info!(entry_id = %saved.id, "Joined waitlist");

    let book = fetch_book_best_effort(deps.catalog.as_ref(), book_id).await;
    Ok(WithBook::new(saved, book))
}

/// 予約待ちから削除する
///
/// 確認は行わない。削除は利用者自身のエントリに限定され、
/// 他の利用者のエントリや存在しないIDは何もせず成功する。
#[tracing::instrument(skip(deps))]
pub async fn remove_waitlist(
    deps: &ServiceDependencies,
    user_id: UserId,
    entry_id: WaitlistEntryId,
) -> Result<()> {
    deps.waitlist_store
        .delete(entry_id, user_id)
        .await
        .map_err(LibraryApplicationError::StoreError)
}
