use crate::domain::{Book, BookId, BookPage, CatalogQuery, WithBook};
use crate::ports::Catalog;
use futures::future::join_all;

use super::ServiceDependencies;
use super::errors::{LibraryApplicationError, Result};

/// カタログを検索する
#[tracing::instrument(skip(deps))]
pub async fn search_books(deps: &ServiceDependencies, query: &CatalogQuery) -> Result<BookPage> {
    deps.catalog
        .search(query)
        .await
        .map_err(LibraryApplicationError::CatalogError)
}

/// 書籍詳細を取得する
///
/// カタログに存在しない場合は `BookNotFound`。
#[tracing::instrument(skip(deps))]
pub async fn get_book(deps: &ServiceDependencies, book_id: BookId) -> Result<Book> {
    deps.catalog
        .get_book(book_id)
        .await
        .map_err(LibraryApplicationError::CatalogError)?
        .ok_or(LibraryApplicationError::BookNotFound)
}

/// 書籍情報を取得できる範囲で取得する
///
/// 一覧の補完用。取得に失敗した場合（エラー・404）はNoneを返し、
/// 呼び出し元の操作は失敗させない。
pub(super) async fn fetch_book_best_effort(catalog: &dyn Catalog, book_id: BookId) -> Option<Book> {
    match catalog.get_book(book_id).await {
        Ok(Some(book)) => Some(book),
        Ok(None) => {
            tracing::warn!(%book_id, "Book not found in catalog, showing entry without details");
            None
        }
        Err(e) => {
            tracing::warn!(%book_id, error = %e, "Could not fetch book details");
            None
        }
    }
}

/// レコードの一覧を書籍情報で補完する
///
/// 書籍の取得は並行して行う。個々の取得失敗はその要素の `book` をNoneにするだけ。
pub(super) async fn with_books<T>(
    catalog: &dyn Catalog,
    records: Vec<T>,
    book_id_of: impl Fn(&T) -> BookId,
) -> Vec<WithBook<T>> {
    let books = join_all(
        records
            .iter()
            .map(|record| fetch_book_best_effort(catalog, book_id_of(record))),
    )
    .await;

    records
        .into_iter()
        .zip(books)
        .map(|(record, book)| WithBook::new(record, book))
        .collect()
}
