use crate::application::{ErrorKind, LibraryApplicationError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーをラップし、HTTPレスポンスへのマッピングを提供する。
#[derive(Debug)]
pub struct ApiError(LibraryApplicationError);

impl From<LibraryApplicationError> for ApiError {
    fn from(err: LibraryApplicationError) -> Self {
        ApiError(err)
    }
}

/// エラー種別ごとのHTTPステータス
///
/// - 認証: 401
/// - ビジネスルール違反: 409
/// - 存在しない: 404
/// - 外部サービスの障害: 502
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::RuleViolation => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::RemoteFetch => StatusCode::BAD_GATEWAY,
    }
}

fn error_code(err: &LibraryApplicationError) -> &'static str {
    match err {
        LibraryApplicationError::AuthenticationRequired => "AUTHENTICATION_REQUIRED",
        LibraryApplicationError::SignInFailed(_) => "SIGN_IN_FAILED",
        LibraryApplicationError::SignUpFailed(_) => "SIGN_UP_FAILED",
        LibraryApplicationError::SignOutFailed(_) => "SIGN_OUT_FAILED",
        LibraryApplicationError::AlreadyBorrowed => "ALREADY_BORROWED",
        LibraryApplicationError::DuplicateLoan => "DUPLICATE_LOAN",
        LibraryApplicationError::AlreadyOnWaitlist => "ALREADY_ON_WAITLIST",
        LibraryApplicationError::BookAvailable => "BOOK_AVAILABLE",
        LibraryApplicationError::AlreadyHolding => "ALREADY_HOLDING",
        LibraryApplicationError::LoanNotFound => "LOAN_NOT_FOUND",
        LibraryApplicationError::BookNotFound => "BOOK_NOT_FOUND",
        LibraryApplicationError::StoreError(_) => "STORE_ERROR",
        LibraryApplicationError::CatalogError(_) => "CATALOG_ERROR",
        LibraryApplicationError::AuthServiceError(_) => "AUTH_SERVICE_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();

        match kind {
            // 外部サービスの障害の詳細はログに記録し、クライアントには一般的なメッセージのみを返す
            ErrorKind::RemoteFetch => {
                let source = std::error::Error::source(&self.0)
                    .map(ToString::to_string)
                    .unwrap_or_default();
                tracing::error!(error = %self.0, %source, "Remote service failure");
            }
            ErrorKind::RuleViolation => tracing::warn!(error = %self.0, "Request rejected"),
            ErrorKind::Authentication | ErrorKind::NotFound => {
                tracing::debug!(error = %self.0, "Request failed")
            }
        }

        let body = Json(ErrorResponse::new(error_code(&self.0), self.0.user_message()));
        (status_for(kind), body).into_response()
    }
}
