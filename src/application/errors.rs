use crate::ports::StoreError;
use thiserror::Error;

/// エラーの分類
///
/// 呼び出し側（クライアントシェル・HTTP層）はこの分類で表示方法を決める。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// セッションがない・無効、または認証操作の失敗
    Authentication,
    /// ビジネスルール違反（警告として表示、再試行しない）
    RuleViolation,
    /// 対象が存在しない
    NotFound,
    /// 外部サービスの障害
    RemoteFetch,
}

/// 図書館アプリケーション層のエラー
#[derive(Debug, Error)]
pub enum LibraryApplicationError {
    /// 有効なセッションがない
    #[error("Authentication required")]
    AuthenticationRequired,

    /// サインインに失敗した
    #[error("Sign-in failed")]
    SignInFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// サインアップに失敗した
    #[error("Sign-up failed")]
    SignUpFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// サインアウトに失敗した
    #[error("Sign-out failed")]
    SignOutFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 書籍が他の利用者に貸出中
    #[error("Book is already borrowed")]
    AlreadyBorrowed,

    /// 同じ書籍を既に借りている
    #[error("Book is already borrowed by this user")]
    DuplicateLoan,

    /// 既に予約待ちに登録済み
    #[error("Already on the waitlist for this book")]
    AlreadyOnWaitlist,

    /// 書籍が貸出可能（待つ必要がない）
    #[error("Book is available, nothing to wait for")]
    BookAvailable,

    /// 自分が借りている書籍の予約待ちはできない
    #[error("User already holds this book")]
    AlreadyHolding,

    /// 貸出が見つからない
    #[error("Loan not found")]
    LoanNotFound,

    /// 書籍がカタログに存在しない
    #[error("Book not found")]
    BookNotFound,

    /// リモートストアのエラー
    #[error("Store error")]
    StoreError(#[source] StoreError),

    /// カタログAPIのエラー
    #[error("Catalog error")]
    CatalogError(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// 認証サービスのエラー
    #[error("Auth service error")]
    AuthServiceError(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl LibraryApplicationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AuthenticationRequired
            | Self::SignInFailed(_)
            | Self::SignUpFailed(_)
            | Self::SignOutFailed(_) => ErrorKind::Authentication,
            Self::AlreadyBorrowed
            | Self::DuplicateLoan
            | Self::AlreadyOnWaitlist
            | Self::BookAvailable
            | Self::AlreadyHolding => ErrorKind::RuleViolation,
            Self::LoanNotFound | Self::BookNotFound => ErrorKind::NotFound,
            Self::StoreError(_) | Self::CatalogError(_) | Self::AuthServiceError(_) => {
                ErrorKind::RemoteFetch
            }
        }
    }

    /// 利用者に表示するメッセージ
    ///
    /// 外部サービスの障害は詳細を含めず一般的なメッセージのみを返す。
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::AuthenticationRequired => "You need to sign in to do that.",
            Self::SignInFailed(_) => "Invalid credentials or account does not exist.",
            Self::SignUpFailed(_) => "Could not create the account. Please try again.",
            Self::SignOutFailed(_) => "Could not end the session.",
            Self::AlreadyBorrowed => "This book is currently borrowed by another reader.",
            Self::DuplicateLoan => "You have already borrowed this book.",
            Self::AlreadyOnWaitlist => "You are already on the waitlist for this book.",
            Self::BookAvailable => "This book is available, you can borrow it right away.",
            Self::AlreadyHolding => "You are currently holding this book.",
            Self::LoanNotFound => "Loan not found.",
            Self::BookNotFound => "Book not found.",
            Self::StoreError(_) | Self::CatalogError(_) | Self::AuthServiceError(_) => {
                "Something went wrong. Please try again later."
            }
        }
    }
}

/// アプリケーション層の Result型
pub type Result<T> = std::result::Result<T, LibraryApplicationError>;
