use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::BookId;

/// 「おすすめ」「人気」セクションそれぞれの表示件数
pub const SECTION_SIZE: usize = 8;

/// 表紙画像として扱うフォーマットのcontent-type
pub const COVER_FORMAT: &str = "image/jpeg";

/// 著者
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

/// 書籍 - カタログAPIから取得した不変のメタデータ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    #[serde(default)]
    pub authors: Vec<Author>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    /// content-type → URL
    #[serde(default)]
    pub formats: BTreeMap<String, String>,
    #[serde(default)]
    pub download_count: u64,
}

impl Book {
    /// 表紙画像のURL（`image/jpeg` フォーマットがない場合はNone）
    pub fn cover_url(&self) -> Option<&str> {
        self.formats.get(COVER_FORMAT).map(String::as_str)
    }

    /// 著者名をカンマ区切りで連結する
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// カタログ検索結果の1ページ
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPage {
    #[serde(default)]
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<Book>,
}

/// カタログの並び順
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSort {
    Popular,
    Ascending,
    Descending,
}

impl CatalogSort {
    pub fn as_str(&self) -> &'static str {
        match self {
            CatalogSort::Popular => "popular",
            CatalogSort::Ascending => "ascending",
            CatalogSort::Descending => "descending",
        }
    }
}

/// カタログ検索条件
///
/// 空の条件はカタログの既定の一覧（人気順の1ページ目）を意味する。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    pub topic: Option<String>,
    pub sort: Option<CatalogSort>,
    pub page: Option<u32>,
}

impl CatalogQuery {
    /// カタログAPIのクエリパラメータに変換する
    ///
    /// 空文字の条件は送らない。`languages` はカンマ区切りにまとめる。
    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();

        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if !self.languages.is_empty() {
            pairs.push(("languages", self.languages.join(",")));
        }
        if let Some(topic) = self.topic.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("topic", topic.to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        if let Some(page) = self.page {
            pairs.push(("page", page.to_string()));
        }

        pairs
    }
}

/// 書籍情報で補完されたレコード
///
/// 貸出・お気に入り・予約待ちの一覧で使う。書籍の取得に失敗した場合は
/// `book` がNoneになり、一覧全体は失敗しない。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithBook<T> {
    #[serde(flatten)]
    pub record: T,
    pub book: Option<Book>,
}

impl<T> WithBook<T> {
    pub fn new(record: T, book: Option<Book>) -> Self {
        Self { record, book }
    }

    pub fn without_book(record: T) -> Self {
        Self { record, book: None }
    }
}

impl<T> std::ops::Deref for WithBook<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.record
    }
}

// ============================================================================
// セレクタ（純粋関数）
// ============================================================================

/// タイトルで絞り込む（大文字小文字を区別しない部分一致）
///
/// 空白のみのクエリは絞り込みなしとして扱う。
pub fn filter_by_title<'a>(books: &'a [Book], query: &str) -> Vec<&'a Book> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return books.iter().collect();
    }

    books
        .iter()
        .filter(|b| b.title.to_lowercase().contains(&query))
        .collect()
}

/// 「おすすめ」セクション: 先頭8件
pub fn recommended<'a>(books: &[&'a Book]) -> Vec<&'a Book> {
    books.iter().take(SECTION_SIZE).copied().collect()
}

/// 「人気」セクション: 9件目から8件
pub fn popular<'a>(books: &[&'a Book]) -> Vec<&'a Book> {
    books
        .iter()
        .skip(SECTION_SIZE)
        .take(SECTION_SIZE)
        .copied()
        .collect()
}
