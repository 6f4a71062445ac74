use serde::{Deserialize, Serialize};

use crate::domain::{BookId, CatalogQuery, CatalogSort};

/// 書籍検索のクエリパラメータ（GET /books）
#[derive(Debug, Default, Deserialize)]
pub struct SearchBooksParams {
    pub search: Option<String>,
    /// カンマ区切りの言語コード
    pub languages: Option<String>,
    pub topic: Option<String>,
    pub sort: Option<CatalogSort>,
    pub page: Option<u32>,
}

impl SearchBooksParams {
    pub fn into_query(self) -> CatalogQuery {
        let languages = self
            .languages
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect();

        CatalogQuery {
            search: self.search,
            languages,
            topic: self.topic,
            sort: self.sort,
            page: self.page,
        }
    }
}

/// 書籍IDを受け取るリクエスト（POST /loans, /favorites/toggle, /waitlist）
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub book_id: BookId,
}

/// サインイン・サインアップのリクエスト
#[derive(Deserialize)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// エラーレスポンス
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
        }
    }
}
