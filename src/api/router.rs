use axum::{
    Router,
    routing::{delete, get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::handlers::{
    AppState, create_loan, get_book, join_waitlist, list_favorites, list_loans, list_waitlist,
    remove_waitlist, return_loan, search_books, sign_in, sign_out, sign_up, toggle_favorite,
};

/// Creates the API router
///
/// Catalog (public):
/// - GET /books - Search the catalog
/// - GET /books/:id - Book details
///
/// Auth:
/// - POST /auth/sign-in, /auth/sign-up, /auth/sign-out
///
/// Lending (bearer token required):
/// - GET/POST /loans, POST /loans/:id/return
/// - GET /favorites, POST /favorites/toggle
/// - GET/POST /waitlist, DELETE /waitlist/:id
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health check endpoint
        .route("/health", get(health_check))
        // Catalog
        .route("/books", get(search_books))
        .route("/books/:id", get(get_book))
        // Auth
        .route("/auth/sign-in", post(sign_in))
        .route("/auth/sign-up", post(sign_up))
        .route("/auth/sign-out", post(sign_out))
        // Loans
        .route("/loans", get(list_loans).post(create_loan))
        .route("/loans/:id/return", post(return_loan))
        // Favorites
        .route("/favorites", get(list_favorites))
        .route("/favorites/toggle", post(toggle_favorite))
        // Waitlist
        .route("/waitlist", get(list_waitlist).post(join_waitlist))
        .route("/waitlist/:id", delete(remove_waitlist))
        // Add tracing middleware
        .layer(TraceLayer::new_for_http())
        // Add application state
        .with_state(state)
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
