use crate::application::{self, ServiceDependencies, authenticate_token};
use crate::domain::{
    AuthUser, Book, BookId, BookPage, Favorite, FavoriteToggle, Loan, LoanId, Session, SignUp,
    WaitlistEntry, WaitlistEntryId, WithBook,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, header},
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{BookRequest, CredentialsRequest, SearchBooksParams},
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

// ============================================================================
// Session gate
// ============================================================================

/// `Authorization: Bearer <token>` からアクセストークンを取り出す
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}

/// リクエストの利用者を確定する
///
/// トークンがない・無効な場合は401。
async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<AuthUser, ApiError> {
    Ok(authenticate_token(&state.service_deps, bearer_token(headers)).await?)
}

// ============================================================================
// Catalog (GET)
// ============================================================================

/// GET /books - カタログを検索
///
/// クエリパラメータ: search, languages（カンマ区切り）, topic, sort, page
pub async fn search_books(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchBooksParams>,
) -> Result<Json<BookPage>, ApiError> {
    let query = params.into_query();
    let page = application::search_books(&state.service_deps, &query).await?;
    Ok(Json(page))
}

/// GET /books/:id - 書籍詳細を取得
pub async fn get_book(
    State(state): State<Arc<AppState>>,
    Path(book_id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let book = application::get_book(&state.service_deps, BookId::new(book_id)).await?;
    Ok(Json(book))
}

// ============================================================================
// Auth
// ============================================================================

/// POST /auth/sign-in - サインイン
pub async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<Json<Session>, ApiError> {
    let session = application::sign_in(&state.service_deps, &req.email, &req.password).await?;
    Ok(Json(session))
}

/// POST /auth/sign-up - アカウントを作成
///
/// メール確認が必要な設定では `session` がnullになる。
pub async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CredentialsRequest>,
) -> Result<(StatusCode, Json<SignUp>), ApiError> {
    let sign_up = application::sign_up(&state.service_deps, &req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(sign_up)))
}

/// POST /auth/sign-out - Bearerトークンのセッションを終了
pub async fn sign_out(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let session = Session {
        access_token: bearer_token(&headers).unwrap_or_default().to_string(),
        refresh_token: None,
        expires_at: None,
        user,
    };

    application::sign_out(&state.service_deps, &session).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Loans
// ============================================================================

/// GET /loans - 利用者の貸出一覧（書籍情報つき）
pub async fn list_loans(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<WithBook<Loan>>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let loans = application::list_loans(&state.service_deps, user.id).await?;
    Ok(Json(loans))
}

/// POST /loans - 新しい貸出を作成
///
/// 強制されるビジネスルール:
/// - 利用者が同じ書籍を貸出中でないこと
/// - 書籍単位の方針では、書籍が他の利用者に貸出中でないこと
pub async fn create_loan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<Loan>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let loan = application::create_loan(&state.service_deps, user.id, req.book_id).await?;
    Ok((StatusCode::CREATED, Json(loan)))
}

/// POST /loans/:id/return - 書籍を返却
///
/// 返却済みの貸出に対しても成功し、返却日時を更新する。
/// 他の利用者の貸出は404。
pub async fn return_loan(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(loan_id): Path<Uuid>,
) -> Result<Json<Loan>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let loan =
        application::return_loan(&state.service_deps, user.id, LoanId::from_uuid(loan_id)).await?;
    Ok(Json(loan))
}

// ============================================================================
// Favorites
// ============================================================================

/// GET /favorites - 利用者のお気に入り一覧（書籍情報つき）
pub async fn list_favorites(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<WithBook<Favorite>>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let favorites = application::list_favorites(&state.service_deps, user.id).await?;
    Ok(Json(favorites))
}

/// POST /favorites/toggle - お気に入りを切り替え
pub async fn toggle_favorite(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<Json<FavoriteToggle>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let toggle = application::toggle_favorite(&state.service_deps, user.id, req.book_id).await?;
    Ok(Json(toggle))
}

// ============================================================================
// Waitlist
// ============================================================================

/// GET /waitlist - 利用者の予約待ち一覧（登録順、書籍情報つき）
pub async fn list_waitlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<WithBook<WaitlistEntry>>>, ApiError> {
    let user = authenticate(&state, &headers).await?;
    let entries = application::list_waitlist(&state.service_deps, user.id).await?;
    Ok(Json(entries))
}

/// POST /waitlist - 予約待ちに登録
///
/// 強制されるビジネスルール:
/// - 同じ書籍の予約待ちに登録済みでないこと
/// - 書籍が貸出中であること
/// - 自分が借りている書籍でないこと
pub async fn join_waitlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<WithBook<WaitlistEntry>>), ApiError> {
    let user = authenticate(&state, &headers).await?;
    let entry = application::join_waitlist(&state.service_deps, user.id, req.book_id).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /waitlist/:id - 予約待ちから削除
pub async fn remove_waitlist(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(entry_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user = authenticate(&state, &headers).await?;
    application::remove_waitlist(
        &state.service_deps,
        user.id,
        WaitlistEntryId::from_uuid(entry_id),
    )
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
