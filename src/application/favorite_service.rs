use crate::domain::{self, BookId, Favorite, FavoriteToggle, UserId, WithBook};
use crate::ports::StoreError;
use chrono::Utc;

use super::ServiceDependencies;
use super::catalog_service::with_books;
use super::errors::{LibraryApplicationError, Result};

/// 利用者のお気に入り一覧を取得する
#[tracing::instrument(skip(deps))]
pub async fn list_favorites(
    deps: &ServiceDependencies,
    user_id: UserId,
) -> Result<Vec<WithBook<Favorite>>> {
    let favorites = deps
        .favorite_store
        .list_for_user(user_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    Ok(with_books(deps.catalog.as_ref(), favorites, |fav| fav.book_id).await)
}

/// お気に入りを切り替える
///
/// 登録済みなら削除して既存の行を返し、未登録なら登録して新しい行を返す。
/// 2回続けて呼ぶと元の状態に戻る。
#[tracing::instrument(skip(deps))]
pub async fn toggle_favorite(
    deps: &ServiceDependencies,
    user_id: UserId,
    book_id: BookId,
) -> Result<FavoriteToggle> {
    let existing = deps
        .favorite_store
        .find(user_id, book_id)
        .await
        .map_err(LibraryApplicationError::StoreError)?;

    if let Some(existing) = existing {
        deps.favorite_store
            .delete(existing.id)
            .await
            .map_err(LibraryApplicationError::StoreError)?;

        tracing::info!("Favorite removed");
        return Ok(FavoriteToggle::Removed(existing));
    }

    let favorite = domain::favorite::favorite(user_id, book_id, Utc::now());
    match deps.favorite_store.insert(&favorite).await {
        Ok(saved) => {
            tracing::info!("Favorite added");
            Ok(FavoriteToggle::Added(saved))
        }
        // 同時実行で先に登録された行があれば、それを登録結果として返す
        Err(StoreError::Conflict(_)) => deps
            .favorite_store
            .find(user_id, book_id)
            .await
            .map_err(LibraryApplicationError::StoreError)?
            .map(FavoriteToggle::Added)
            .ok_or_else(|| {
                LibraryApplicationError::StoreError(StoreError::Conflict(
                    "favorites_user_book_key".to_string(),
                ))
            }),
        Err(e) => Err(LibraryApplicationError::StoreError(e)),
    }
}
