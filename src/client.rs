use crate::application::{self, LibraryApplicationError, Result, ServiceDependencies};
use crate::domain::{
    AuthEvent, AuthEventKind, Book, BookId, BookPage, CatalogQuery, Favorite, FavoriteToggle,
    Loan, LoanId, Session, SignUp, UserId, WaitlistEntry, WaitlistEntryId, WithBook,
};
use crate::state::{LibraryState, Store};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

/// クライアントシェル
///
/// ユースケース関数を呼び出し、結果をストアに反映する。
/// 失敗した場合は該当スライスの `error` に利用者向けメッセージを入れ、エラーを返す。
#[derive(Clone)]
pub struct LibraryClient {
    deps: ServiceDependencies,
    store: Store,
}

impl LibraryClient {
    pub fn new(deps: ServiceDependencies, store: Store) -> Self {
        Self { deps, store }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn session(&self) -> Option<Session> {
        self.store.select(|s| s.auth.session.clone())
    }

    /// 保存済みのセッションを復元する
    ///
    /// 有効性は `init_auth_listener` で検証される。
    pub fn restore_session(&self, session: Session) {
        self.store.update(|s| s.auth.session = Some(session));
    }

    async fn current_user(&self) -> Result<UserId> {
        let session = self.session();
        application::resolve_identity(&self.deps, session.as_ref()).await
    }

    /// 一覧・詳細で取得済みの書籍があれば返す
    fn known_book(&self, book_id: BookId) -> Option<Book> {
        self.store.select(|s| {
            s.books
                .books
                .iter()
                .chain(s.books.selected_book.iter())
                .find(|b| b.id == book_id)
                .cloned()
        })
    }

    fn record_error<T>(
        &self,
        err: LibraryApplicationError,
        apply: impl FnOnce(&mut LibraryState, String),
    ) -> Result<T> {
        let message = err.user_message().to_string();
        self.store.update(|s| apply(s, message));
        Err(err)
    }

    // ========================================================================
    // Books
    // ========================================================================

    pub async fn fetch_books(&self, query: &CatalogQuery) -> Result<BookPage> {
        self.store.update(|s| {
            s.books.is_loading = true;
            s.books.error = None;
        });

        match application::search_books(&self.deps, query).await {
            Ok(page) => {
                let books = page.results.clone();
                self.store.update(|s| {
                    s.books.is_loading = false;
                    s.books.books = books;
                });
                Ok(page)
            }
            Err(e) => self.record_error(e, |s, message| {
                s.books.is_loading = false;
                s.books.error = Some(message);
            }),
        }
    }

    pub async fn fetch_book(&self, book_id: BookId) -> Result<Book> {
        self.store.update(|s| {
            s.books.is_loading = true;
            s.books.error = None;
        });

        match application::get_book(&self.deps, book_id).await {
            Ok(book) => {
                let selected = book.clone();
                self.store.update(|s| {
                    s.books.is_loading = false;
                    s.books.selected_book = Some(selected);
                });
                Ok(book)
            }
            Err(e) => self.record_error(e, |s, message| {
                s.books.is_loading = false;
                s.books.selected_book = None;
                s.books.error = Some(message);
            }),
        }
    }

    pub fn set_query(&self, query: &str) {
        let query = query.to_string();
        self.store.update(|s| s.books.search_query = query);
    }

    // ========================================================================
    // Loans
    // ========================================================================

    pub async fn fetch_loans(&self) -> Result<Vec<WithBook<Loan>>> {
        self.store.update(|s| s.loans.begin_fetch());

        let result = match self.current_user().await {
            Ok(user_id) => application::list_loans(&self.deps, user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(loans) => {
                let items = loans.clone();
                self.store.update(|s| s.loans.finish_fetch(items));
                Ok(loans)
            }
            Err(e) => self.record_error(e, |s, message| s.loans.fail(message)),
        }
    }

    pub async fn create_loan(&self, book_id: BookId) -> Result<Loan> {
        let result = match self.current_user().await {
            Ok(user_id) => application::create_loan(&self.deps, user_id, book_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(loan) => {
                let item = WithBook::new(loan.clone(), self.known_book(book_id));
                self.store.update(|s| {
                    s.loans.error = None;
                    s.loans.push(item);
                });
                Ok(loan)
            }
            Err(e) => self.record_error(e, |s, message| s.loans.error = Some(message)),
        }
    }

    pub async fn return_loan(&self, loan_id: LoanId) -> Result<Loan> {
        let result = match self.current_user().await {
            Ok(user_id) => application::return_loan(&self.deps, user_id, loan_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(loan) => {
                let updated = loan.clone();
                self.store.update(|s| {
                    let book = s.loan(loan_id).and_then(|l| l.book.clone());
                    s.loans.error = None;
                    s.loans
                        .replace_where(WithBook::new(updated, book), |l| l.id == loan_id);
                });
                Ok(loan)
            }
            Err(e) => self.record_error(e, |s, message| s.loans.error = Some(message)),
        }
    }

    // ========================================================================
    // Favorites
    // ========================================================================

    pub async fn fetch_favorites(&self) -> Result<Vec<WithBook<Favorite>>> {
        self.store.update(|s| s.favorites.begin_fetch());

        let result = match self.current_user().await {
            Ok(user_id) => application::list_favorites(&self.deps, user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(favorites) => {
                let items = favorites.clone();
                self.store.update(|s| s.favorites.finish_fetch(items));
                Ok(favorites)
            }
            Err(e) => self.record_error(e, |s, message| s.favorites.fail(message)),
        }
    }

    pub async fn toggle_favorite(&self, book_id: BookId) -> Result<FavoriteToggle> {
        let result = match self.current_user().await {
            Ok(user_id) => application::toggle_favorite(&self.deps, user_id, book_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(toggle) => {
                let added = match &toggle {
                    FavoriteToggle::Added(favorite) => {
                        Some(WithBook::new(favorite.clone(), self.known_book(book_id)))
                    }
                    FavoriteToggle::Removed(_) => None,
                };
                self.store.update(|s| {
                    s.favorites.error = None;
                    match added {
                        // 同時実行で先に登録された行が既に一覧にあれば置き換える
                        Some(item) => s.favorites.upsert_where(item, |f| f.book_id == book_id),
                        None => s.favorites.remove_where(|f| f.book_id == book_id),
                    }
                });
                Ok(toggle)
            }
            Err(e) => self.record_error(e, |s, message| s.favorites.error = Some(message)),
        }
    }

    // ========================================================================
    // Waitlist
    // ========================================================================

    pub async fn fetch_waitlist(&self) -> Result<Vec<WithBook<WaitlistEntry>>> {
        self.store.update(|s| s.waitlist.begin_fetch());

        let result = match self.current_user().await {
            Ok(user_id) => application::list_waitlist(&self.deps, user_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(entries) => {
                let items = entries.clone();
                self.store.update(|s| s.waitlist.finish_fetch(items));
                Ok(entries)
            }
            Err(e) => self.record_error(e, |s, message| s.waitlist.fail(message)),
        }
    }

    pub async fn join_waitlist(&self, book_id: BookId) -> Result<WithBook<WaitlistEntry>> {
        let result = match self.current_user().await {
            Ok(user_id) => application::join_waitlist(&self.deps, user_id, book_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(entry) => {
                let item = entry.clone();
                self.store.update(|s| {
                    s.waitlist.error = None;
                    s.waitlist.push(item);
                });
                Ok(entry)
            }
            Err(e) => self.record_error(e, |s, message| s.waitlist.error = Some(message)),
        }
    }

    pub async fn remove_waitlist(&self, entry_id: WaitlistEntryId) -> Result<()> {
        let result = match self.current_user().await {
            Ok(user_id) => application::remove_waitlist(&self.deps, user_id, entry_id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                self.store.update(|s| {
                    s.waitlist.error = None;
                    s.waitlist.remove_where(|e| e.id == entry_id);
                });
                Ok(())
            }
            Err(e) => self.record_error(e, |s, message| s.waitlist.error = Some(message)),
        }
    }

    // ========================================================================
    // Auth
    // ========================================================================

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        self.store.update(|s| {
            s.auth.loading = true;
            s.auth.error = None;
        });

        match application::sign_in(&self.deps, email, password).await {
            Ok(session) => {
                let current = session.clone();
                self.store.update(|s| {
                    s.auth.loading = false;
                    s.auth.session = Some(current);
                });
                Ok(session)
            }
            Err(e) => self.record_error(e, |s, message| {
                s.auth.loading = false;
                s.auth.error = Some(message);
            }),
        }
    }

    /// アカウントを作成する
    ///
    /// メール確認が必要な設定ではセッションは設定されない。
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<SignUp> {
        self.store.update(|s| {
            s.auth.loading = true;
            s.auth.error = None;
        });

        match application::sign_up(&self.deps, email, password).await {
            Ok(sign_up) => {
                let session = sign_up.session.clone();
                self.store.update(|s| {
                    s.auth.loading = false;
                    if session.is_some() {
                        s.auth.session = session;
                    }
                });
                Ok(sign_up)
            }
            Err(e) => self.record_error(e, |s, message| {
                s.auth.loading = false;
                s.auth.error = Some(message);
            }),
        }
    }

    /// サインアウトし、利用者ごとの状態を破棄する
    pub async fn sign_out(&self) -> Result<()> {
        let Some(session) = self.session() else {
            self.store.update(|s| s.clear_user_lists());
            return Ok(());
        };

        self.store.update(|s| s.auth.loading = true);

        match application::sign_out(&self.deps, &session).await {
            Ok(()) => {
                self.store.update(|s| {
                    s.auth.loading = false;
                    s.auth.error = None;
                    s.auth.session = None;
                    s.clear_user_lists();
                });
                Ok(())
            }
            Err(e) => self.record_error(e, |s, message| {
                s.auth.loading = false;
                s.auth.error = Some(message);
            }),
        }
    }

    /// 認証状態の監視を開始する
    ///
    /// 復元済みのセッションを検証してから、認証イベントをストアに反映するタスクを起動する。
    /// 返された `AuthListener` を破棄するか `unsubscribe()` を呼ぶと監視が止まる。
    pub async fn init_auth_listener(&self) -> AuthListener {
        // 検証中のイベントを取りこぼさないよう先に購読する
        let mut events = self.deps.auth.subscribe();

        self.store.update(|s| s.auth.loading = true);
        self.validate_restored_session().await;

        let store = self.store.clone();
        let handle = tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => apply_auth_event(&store, event),
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Auth listener lagged behind");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });

        AuthListener { handle }
    }

    async fn validate_restored_session(&self) {
        let Some(session) = self.session() else {
            self.store.update(|s| s.auth.loading = false);
            return;
        };

        match self.deps.auth.get_user(&session.access_token).await {
            Ok(Some(user)) => self.store.update(|s| {
                s.auth.loading = false;
                if let Some(current) = s.auth.session.as_mut() {
                    current.user = user;
                }
            }),
            Ok(None) => {
                tracing::info!("Restored session is no longer valid");
                self.store.update(|s| {
                    s.auth.loading = false;
                    s.auth.session = None;
                    s.clear_user_lists();
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Could not validate restored session");
                let message = LibraryApplicationError::AuthServiceError(e)
                    .user_message()
                    .to_string();
                self.store.update(|s| {
                    s.auth.loading = false;
                    s.auth.error = Some(message);
                });
            }
        }
    }
}

fn apply_auth_event(store: &Store, event: AuthEvent) {
    tracing::debug!(kind = ?event.kind, "Applying auth event");
    match event.kind {
        AuthEventKind::SignedOut => store.update(|s| {
            s.auth.session = None;
            s.clear_user_lists();
        }),
        AuthEventKind::SignedIn | AuthEventKind::TokenRefreshed | AuthEventKind::UserUpdated => {
            store.update(|s| s.auth.session = event.session)
        }
    }
}

/// 認証イベント監視のハンドル
#[must_use = "dropping an AuthListener stops it"]
pub struct AuthListener {
    handle: JoinHandle<()>,
}

impl AuthListener {
    pub fn unsubscribe(self) {
        // Dropで停止する
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for AuthListener {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
