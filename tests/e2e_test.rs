use axum::body::Body;
use axum::http::{Request, StatusCode};
use library_lending::api::handlers::AppState;
use library_lending::api::router::create_router;
use library_lending::domain::Session;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

mod common;

use common::{FRANKENSTEIN, ROMEO_AND_JULIET, TestContext};

// ============================================================================
// E2Eテスト用のヘルパー関数
// ============================================================================

/// モックアダプターで組み立てたルーター
fn setup_app(ctx: &TestContext) -> axum::Router {
    let app_state = Arc::new(AppState {
        service_deps: ctx.deps.clone(),
    });
    create_router(app_state)
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    session: Option<&Session>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header("authorization", format!("Bearer {}", session.access_token));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, value)
}

// ============================================================================
// E2Eテスト: 正常系フロー
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_e2e_book_detail() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);

    let (status, body) = send(&app, "GET", "/books/1513", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Romeo and Juliet");
    assert_eq!(body["authors"][0]["name"], "Shakespeare, William");

    let (status, body) = send(&app, "GET", "/books/999999", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "BOOK_NOT_FOUND");
}

#[tokio::test]
async fn test_e2e_search_books() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);

    let (status, body) = send(&app, "GET", "/books?search=pride&languages=en", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
    assert_eq!(body["results"][0]["title"], "Pride and Prejudice");
}

#[tokio::test]
async fn test_e2e_full_loan_flow() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let session = ctx.signed_in("reader@example.com");

    // Step 1: 貸出作成（POST /loans）
    let (status, loan) = send(
        &app,
        "POST",
        "/loans",
        Some(&session),
        Some(json!({ "book_id": ROMEO_AND_JULIET })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(loan["status"], "active");
    assert_eq!(loan["book_id"], ROMEO_AND_JULIET);
    assert_eq!(loan["user_id"], session.user_id().value().to_string());

    // Step 2: 同じ書籍の再貸出は409
    let (status, body) = send(
        &app,
        "POST",
        "/loans",
        Some(&session),
        Some(json!({ "book_id": ROMEO_AND_JULIET })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "DUPLICATE_LOAN");
    assert_eq!(body["message"], "You have already borrowed this book.");

    // Step 3: 一覧（書籍情報つき）
    let (status, loans) = send(&app, "GET", "/loans", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(loans.as_array().unwrap().len(), 1);
    assert_eq!(loans[0]["book"]["title"], "Romeo and Juliet");

    // Step 4: 返却
    let loan_id = loan["id"].as_str().unwrap();
    let (status, returned) = send(
        &app,
        "POST",
        &format!("/loans/{loan_id}/return"),
        Some(&session),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["status"], "returned");
    assert!(returned["returned_at"].is_string());
}

#[tokio::test]
async fn test_e2e_waitlist_flow() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let holder = ctx.signed_in("holder@example.com");
    let reader = ctx.signed_in("reader@example.com");

    // 貸出されていない書籍には登録できない
    let (status, body) = send(
        &app,
        "POST",
        "/waitlist",
        Some(&reader),
        Some(json!({ "book_id": FRANKENSTEIN })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "BOOK_AVAILABLE");

    send(
        &app,
        "POST",
        "/loans",
        Some(&holder),
        Some(json!({ "book_id": FRANKENSTEIN })),
    )
    .await;

    let (status, entry) = send(
        &app,
        "POST",
        "/waitlist",
        Some(&reader),
        Some(json!({ "book_id": FRANKENSTEIN })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["book"]["id"], FRANKENSTEIN);

    let (_, entries) = send(&app, "GET", "/waitlist", Some(&reader), None).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);

    let entry_id = entry["id"].as_str().unwrap();
    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/waitlist/{entry_id}"),
        Some(&reader),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, entries) = send(&app, "GET", "/waitlist", Some(&reader), None).await;
    assert!(entries.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_e2e_toggle_favorite() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let session = ctx.signed_in("reader@example.com");
    let request = json!({ "book_id": ROMEO_AND_JULIET });

    let (status, added) = send(
        &app,
        "POST",
        "/favorites/toggle",
        Some(&session),
        Some(request.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(added["outcome"], "added");

    let (_, favorites) = send(&app, "GET", "/favorites", Some(&session), None).await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);

    let (_, removed) = send(
        &app,
        "POST",
        "/favorites/toggle",
        Some(&session),
        Some(request),
    )
    .await;
    assert_eq!(removed["outcome"], "removed");
    assert_eq!(removed["favorite"]["id"], added["favorite"]["id"]);
}

#[tokio::test]
async fn test_e2e_sign_in_and_out() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    ctx.auth.add_account("reader@example.com", "password123");

    let (status, session) = send(
        &app,
        "POST",
        "/auth/sign-in",
        None,
        Some(json!({ "email": "Reader@Example.com", "password": "password123" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let session: Session = serde_json::from_value(session).unwrap();

    let (status, _) = send(&app, "GET", "/loans", Some(&session), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, "POST", "/auth/sign-out", Some(&session), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app, "GET", "/loans", Some(&session), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// ============================================================================
// E2Eテスト: 異常系
// ============================================================================

#[tokio::test]
async fn test_e2e_missing_token_is_unauthorized() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);

    let (status, body) = send(
        &app,
        "POST",
        "/loans",
        None,
        Some(json!({ "book_id": ROMEO_AND_JULIET })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION_REQUIRED");
    assert!(ctx.loans.all().is_empty());
}

#[tokio::test]
async fn test_e2e_wrong_password_is_unauthorized() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    ctx.auth.add_account("reader@example.com", "password123");

    let (status, body) = send(
        &app,
        "POST",
        "/auth/sign-in",
        None,
        Some(json!({ "email": "reader@example.com", "password": "wrong" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "SIGN_IN_FAILED");
}

#[tokio::test]
async fn test_e2e_returning_another_readers_loan_is_not_found() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let owner = ctx.signed_in("owner@example.com");
    let other = ctx.signed_in("other@example.com");

    let (_, loan) = send(
        &app,
        "POST",
        "/loans",
        Some(&owner),
        Some(json!({ "book_id": ROMEO_AND_JULIET })),
    )
    .await;
    let loan_id = loan["id"].as_str().unwrap();

    let (status, body) = send(
        &app,
        "POST",
        &format!("/loans/{loan_id}/return"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "LOAN_NOT_FOUND");

    let (_, loans) = send(&app, "GET", "/loans", Some(&owner), None).await;
    assert_eq!(loans[0]["status"], "active");
    assert!(loans[0]["returned_at"].is_null());
}

#[tokio::test]
async fn test_e2e_deleting_another_readers_waitlist_entry_keeps_it() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let holder = ctx.signed_in("holder@example.com");
    let reader = ctx.signed_in("reader@example.com");
    let other = ctx.signed_in("other@example.com");
    let book = json!({ "book_id": FRANKENSTEIN });

    send(&app, "POST", "/loans", Some(&holder), Some(book.clone())).await;
    let (_, entry) = send(&app, "POST", "/waitlist", Some(&reader), Some(book)).await;
    let entry_id = entry["id"].as_str().unwrap();

    let (status, _) = send(
        &app,
        "DELETE",
        &format!("/waitlist/{entry_id}"),
        Some(&other),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, entries) = send(&app, "GET", "/waitlist", Some(&reader), None).await;
    assert_eq!(entries.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_e2e_store_outage_is_bad_gateway() {
    let ctx = TestContext::new();
    let app = setup_app(&ctx);
    let session = ctx.signed_in("reader@example.com");
    ctx.loans.set_unavailable(true);

    let (status, body) = send(&app, "GET", "/loans", Some(&session), None).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["message"], "Something went wrong. Please try again later.");
}
