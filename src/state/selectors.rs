use crate::domain::Book;
use crate::domain::book::{filter_by_title, popular, recommended};

use super::slices::LibraryState;

/// 検索クエリで絞り込んだ書籍
pub fn filtered_books(state: &LibraryState) -> Vec<&Book> {
    filter_by_title(&state.books.books, &state.books.search_query)
}

/// 「おすすめ」セクション
pub fn recommended_books(state: &LibraryState) -> Vec<&Book> {
    recommended(&filtered_books(state))
}

/// 「人気」セクション
pub fn popular_books(state: &LibraryState) -> Vec<&Book> {
    popular(&filtered_books(state))
}
