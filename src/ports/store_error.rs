use thiserror::Error;

/// リモートストア操作のエラー
///
/// 一意制約違反（`Conflict`）はアプリケーション層でビジネスルール違反に
/// 読み替えるため、その他の障害（`Backend`）と区別する。
#[derive(Debug, Error)]
pub enum StoreError {
    /// 一意制約違反
    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    /// 接続・クエリ・デコードなどの障害
    #[error("Store backend error")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        StoreError::Backend(err.into())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// ストアポート共通の Result型
pub type Result<T> = std::result::Result<T, StoreError>;
