use library_lending::application::LibraryApplicationError;
use library_lending::client::LibraryClient;
use library_lending::domain::{
    AuthEvent, BookId, CatalogQuery, FavoriteToggle, LoanPolicy, LoanStatus,
};
use library_lending::state::{LibraryState, Store, selectors};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod common;

use common::{FRANKENSTEIN, ROMEO_AND_JULIET, TestContext};

fn client(ctx: &TestContext) -> LibraryClient {
    LibraryClient::new(ctx.deps.clone(), Store::new())
}

/// 監視タスクが状態を反映するまで待つ
async fn wait_until(store: &Store, predicate: impl Fn(&LibraryState) -> bool) {
    let result = tokio::time::timeout(Duration::from_secs(1), async {
        while !store.select(&predicate) {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "store did not reach expected state");
}

// ============================================================================
// 書籍
// ============================================================================

#[tokio::test]
async fn test_fetch_books_and_select_sections() {
    let ctx = TestContext::new();
    let client = client(&ctx);

    client.fetch_books(&CatalogQuery::default()).await.unwrap();
    client.set_query("romeo");

    let state = client.store().snapshot();
    assert!(!state.books.is_loading);
    assert_eq!(state.books.books.len(), 3);
    let recommended = selectors::recommended_books(&state);
    assert_eq!(recommended.len(), 1);
    assert_eq!(recommended[0].title, "Romeo and Juliet");
    assert!(selectors::popular_books(&state).is_empty());
}

#[tokio::test]
async fn test_fetch_books_failure_sets_error() {
    let ctx = TestContext::new();
    ctx.catalog.fail_search();
    let client = client(&ctx);

    let result = client.fetch_books(&CatalogQuery::default()).await;

    assert!(result.is_err());
    let state = client.store().snapshot();
    assert!(!state.books.is_loading);
    assert_eq!(
        state.books.error.as_deref(),
        Some("Something went wrong. Please try again later.")
    );
}

#[tokio::test]
async fn test_fetch_book_sets_selected_book() {
    let ctx = TestContext::new();
    let client = client(&ctx);

    client.fetch_book(BookId::new(ROMEO_AND_JULIET)).await.unwrap();

    let selected = client.store().select(|s| s.books.selected_book.clone());
    assert_eq!(selected.unwrap().author_names(), "Shakespeare, William");
}

// ============================================================================
// 利用者ごとの一覧
// ============================================================================

#[tokio::test]
async fn test_lending_requires_sign_in() {
    let ctx = TestContext::new();
    let client = client(&ctx);

    let result = client.create_loan(BookId::new(ROMEO_AND_JULIET)).await;

    assert!(matches!(
        result,
        Err(LibraryApplicationError::AuthenticationRequired)
    ));
    assert!(ctx.loans.all().is_empty());
    assert_eq!(
        client.store().select(|s| s.loans.error.clone()).as_deref(),
        Some("You need to sign in to do that.")
    );
}

#[tokio::test]
async fn test_loan_lifecycle_updates_store() {
    let ctx = TestContext::new();
    ctx.auth.add_account("reader@example.com", "password123");
    let client = client(&ctx);
    client
        .sign_in("reader@example.com", "password123")
        .await
        .unwrap();
    client.fetch_book(BookId::new(ROMEO_AND_JULIET)).await.unwrap();

    let loan = client
        .create_loan(BookId::new(ROMEO_AND_JULIET))
        .await
        .unwrap();

    let items = client.store().select(|s| s.loans.items.clone());
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].book.as_ref().map(|b| b.title.as_str()),
        Some("Romeo and Juliet")
    );

    let duplicate = client.create_loan(BookId::new(ROMEO_AND_JULIET)).await;
    assert!(matches!(
        duplicate,
        Err(LibraryApplicationError::DuplicateLoan)
    ));
    assert_eq!(
        client.store().select(|s| s.loans.error.clone()).as_deref(),
        Some("You have already borrowed this book.")
    );

    client.return_loan(loan.id).await.unwrap();
    let state = client.store().snapshot();
    let returned = state.loan(loan.id).unwrap();
    assert_eq!(returned.status, LoanStatus::Returned);
    assert!(returned.book.is_some());
    assert_eq!(state.loans.error, None);

    let fetched = client.fetch_loans().await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(client.store().select(|s| s.loans.items.len()), 1);
}

#[tokio::test]
async fn test_favorites_and_waitlist_update_store() {
    let ctx = TestContext::new();
    let holder = ctx.signed_in("holder@example.com");
    let reader = ctx.signed_in("reader@example.com");

    let holder_client = client(&ctx);
    holder_client.restore_session(holder);
    holder_client
        .create_loan(BookId::new(FRANKENSTEIN))
        .await
        .unwrap();

    let client = client(&ctx);
    client.restore_session(reader);

    let toggle = client
        .toggle_favorite(BookId::new(ROMEO_AND_JULIET))
        .await
        .unwrap();
    assert!(matches!(toggle, FavoriteToggle::Added(_)));
    assert!(client.store().select(|s| s.is_favorite(BookId::new(ROMEO_AND_JULIET))));

    client
        .toggle_favorite(BookId::new(ROMEO_AND_JULIET))
        .await
        .unwrap();
    assert!(!client.store().select(|s| s.is_favorite(BookId::new(ROMEO_AND_JULIET))));

    let entry = client
        .join_waitlist(BookId::new(FRANKENSTEIN))
        .await
        .unwrap();
    assert!(client.store().select(|s| s.waitlist_entry(entry.id).is_some()));

    let rejected = client.join_waitlist(BookId::new(ROMEO_AND_JULIET)).await;
    assert!(matches!(
        rejected,
        Err(LibraryApplicationError::BookAvailable)
    ));
    assert_eq!(client.store().select(|s| s.waitlist.items.len()), 1);

    client.remove_waitlist(entry.id).await.unwrap();
    assert!(client.store().select(|s| s.waitlist.items.is_empty()));
}

#[tokio::test]
async fn test_concurrent_favorite_adds_keep_one_item() {
    let ctx = TestContext::interleaved(LoanPolicy::PerBook);
    let session = ctx.signed_in("reader@example.com");
    let client = client(&ctx);
    client.restore_session(session);

    let (a, b) = tokio::join!(
        client.toggle_favorite(BookId::new(ROMEO_AND_JULIET)),
        client.toggle_favorite(BookId::new(ROMEO_AND_JULIET)),
    );

    assert!(matches!(a, Ok(FavoriteToggle::Added(_))));
    assert!(matches!(b, Ok(FavoriteToggle::Added(_))));
    let items = client.store().select(|s| s.favorites.items.clone());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, ctx.favorites.all()[0].id);
}

#[tokio::test]
async fn test_sign_out_clears_user_lists() {
    let ctx = TestContext::new();
    let session = ctx.signed_in("reader@example.com");
    let client = client(&ctx);
    client.restore_session(session);
    client
        .toggle_favorite(BookId::new(ROMEO_AND_JULIET))
        .await
        .unwrap();
    client.fetch_books(&CatalogQuery::default()).await.unwrap();

    client.sign_out().await.unwrap();

    let state = client.store().snapshot();
    assert!(state.auth.session.is_none());
    assert!(state.favorites.items.is_empty());
    assert_eq!(state.books.books.len(), 3);
}

#[tokio::test]
async fn test_store_listeners_see_each_change() {
    let ctx = TestContext::new();
    let client = client(&ctx);
    let notifications = Arc::new(AtomicUsize::new(0));
    let counter = notifications.clone();
    let subscription = client.store().subscribe(move |_| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    client.fetch_books(&CatalogQuery::default()).await.unwrap();
    // 読み込み開始と完了
    assert_eq!(notifications.load(Ordering::SeqCst), 2);

    subscription.unsubscribe();
    client.set_query("hamlet");
    assert_eq!(notifications.load(Ordering::SeqCst), 2);
}

// ============================================================================
// 認証イベントの監視
// ============================================================================

#[tokio::test]
async fn test_restored_session_is_validated() {
    let ctx = TestContext::new();
    let session = ctx.signed_in("reader@example.com");
    let client = client(&ctx);
    client.restore_session(session.clone());

    let _listener = client.init_auth_listener().await;

    let state = client.store().snapshot();
    assert_eq!(state.auth.session, Some(session));
    assert!(!state.auth.loading);
}

#[tokio::test]
async fn test_invalid_restored_session_is_dropped() {
    let ctx = TestContext::new();
    let mut session = ctx.signed_in("reader@example.com");
    session.access_token = "expired".to_string();
    let client = client(&ctx);
    client.restore_session(session);

    let _listener = client.init_auth_listener().await;

    assert!(client.store().select(|s| s.auth.session.is_none()));
}

#[tokio::test]
async fn test_auth_events_are_applied() {
    let ctx = TestContext::new();
    let client = client(&ctx);
    let listener = client.init_auth_listener().await;
    assert!(listener.is_running());

    let session = ctx.signed_in("reader@example.com");
    ctx.auth.emit(AuthEvent::signed_in(session.clone()));
    wait_until(client.store(), |s| s.auth.session.is_some()).await;

    client
        .toggle_favorite(BookId::new(ROMEO_AND_JULIET))
        .await
        .unwrap();
    ctx.auth.emit(AuthEvent::signed_out());
    wait_until(client.store(), |s| {
        s.auth.session.is_none() && s.favorites.items.is_empty()
    })
    .await;
}

#[tokio::test]
async fn test_unsubscribed_listener_ignores_events() {
    let ctx = TestContext::new();
    let client = client(&ctx);
    let listener = client.init_auth_listener().await;

    listener.unsubscribe();
    let session = ctx.signed_in("reader@example.com");
    ctx.auth.emit(AuthEvent::signed_in(session));
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(client.store().select(|s| s.auth.session.is_none()));
}
