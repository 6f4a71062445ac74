use crate::domain::book::filter_by_title;
use crate::domain::{Book, BookId, BookPage, CatalogQuery};
use crate::ports::catalog::{Catalog as CatalogTrait, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;

/// Catalogのモック実装
///
/// 登録した書籍をメモリ上に保持する。
/// 取得を失敗させる書籍IDを指定して、補完の劣化をテストできる。
pub struct Catalog {
    books: Mutex<BTreeMap<BookId, Book>>,
    failing_books: Mutex<HashSet<BookId>>,
    search_unavailable: Mutex<bool>,
}

impl Catalog {
    pub fn new() -> Self {
        Self {
            books: Mutex::new(BTreeMap::new()),
            failing_books: Mutex::new(HashSet::new()),
            search_unavailable: Mutex::new(false),
        }
    }

    /// テスト用に書籍を登録
    pub fn add_book(&self, book: Book) {
        self.books.lock().unwrap().insert(book.id, book);
    }

    /// 指定した書籍の取得をエラーにする
    pub fn fail_book(&self, book_id: BookId) {
        self.failing_books.lock().unwrap().insert(book_id);
    }

    /// 検索をエラーにする
    pub fn fail_search(&self) {
        *self.search_unavailable.lock().unwrap() = true;
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogTrait for Catalog {
    /// タイトルの部分一致と言語で検索し、ダウンロード数の多い順に返す
    ///
    /// ページ分割は行わない。
    async fn search(&self, query: &CatalogQuery) -> Result<BookPage> {
        if *self.search_unavailable.lock().unwrap() {
            return Err("catalog unavailable".into());
        }

        let books: Vec<Book> = self.books.lock().unwrap().values().cloned().collect();
        let search = query.search.as_deref().unwrap_or("");
        let mut results: Vec<Book> = filter_by_title(&books, search)
            .into_iter()
            .filter(|b| {
                query.languages.is_empty()
                    || b.languages.iter().any(|l| query.languages.contains(l))
            })
            .cloned()
            .collect();
        results.sort_by(|a, b| b.download_count.cmp(&a.download_count));

        Ok(BookPage {
            count: results.len() as u64,
            next: None,
            previous: None,
            results,
        })
    }

    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>> {
        if self.failing_books.lock().unwrap().contains(&book_id) {
            return Err(format!("catalog request for book {} failed", book_id).into());
        }
        Ok(self.books.lock().unwrap().get(&book_id).cloned())
    }
}
