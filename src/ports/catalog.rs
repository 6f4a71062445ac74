use crate::domain::{Book, BookId, BookPage, CatalogQuery};
use async_trait::async_trait;

pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// カタログポート
///
/// 公開書籍カタログ（読み取り専用の外部API）を抽象化する。
/// 貸出・お気に入り・予約待ちは書籍IDのみを保持し、詳細はここから取得する。
#[async_trait]
pub trait Catalog: Send + Sync {
    /// 条件に一致する書籍を1ページ分検索する
    async fn search(&self, query: &CatalogQuery) -> Result<BookPage>;

    /// IDで書籍を取得する
    ///
    /// 存在しない場合（404）は `Ok(None)` を返す。
    async fn get_book(&self, book_id: BookId) -> Result<Option<Book>>;
}
