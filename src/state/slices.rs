use crate::domain::{Book, BookId, Favorite, Loan, LoanId, Session, WaitlistEntry, WaitlistEntryId, WithBook};

// ============================================================================
// Books
// ============================================================================

/// 書籍一覧の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BooksState {
    pub books: Vec<Book>,
    pub is_loading: bool,
    pub search_query: String,
    pub error: Option<String>,
    pub selected_book: Option<Book>,
}

// ============================================================================
// Auth
// ============================================================================

/// 認証の状態
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthState {
    pub session: Option<Session>,
    pub loading: bool,
    pub error: Option<String>,
}

impl AuthState {
    pub fn is_signed_in(&self) -> bool {
        self.session.is_some()
    }
}

// ============================================================================
// 利用者ごとの一覧
// ============================================================================

/// 利用者ごとの一覧（貸出・お気に入り・予約待ち）の状態
///
/// 取得成功時は丸ごと置き換え、それ以外は追加・ID単位の置換・ID単位の除去のみ行う。
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            loading: false,
            error: None,
        }
    }
}

impl<T> ListState<T> {
    pub fn begin_fetch(&mut self) {
        self.loading = true;
        self.error = None;
    }

    pub fn finish_fetch(&mut self, items: Vec<T>) {
        self.loading = false;
        self.items = items;
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.loading = false;
        self.error = Some(message.into());
    }

    pub fn push(&mut self, item: T) {
        self.items.push(item);
    }

    /// 条件に一致する最初の要素を置き換える
    pub fn replace_where(&mut self, item: T, matches: impl Fn(&T) -> bool) {
        if let Some(slot) = self.items.iter_mut().find(|existing| matches(existing)) {
            *slot = item;
        }
    }

    /// 条件に一致する要素を置き換え、なければ追加する
    pub fn upsert_where(&mut self, item: T, matches: impl Fn(&T) -> bool) {
        match self.items.iter_mut().find(|existing| matches(existing)) {
            Some(slot) => *slot = item,
            None => self.items.push(item),
        }
    }

    pub fn remove_where(&mut self, matches: impl Fn(&T) -> bool) {
        self.items.retain(|item| !matches(item));
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

// ============================================================================
// 全体
// ============================================================================

/// クライアントの状態全体
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LibraryState {
    pub books: BooksState,
    pub auth: AuthState,
    pub loans: ListState<WithBook<Loan>>,
    pub favorites: ListState<WithBook<Favorite>>,
    pub waitlist: ListState<WithBook<WaitlistEntry>>,
}

impl LibraryState {
    /// サインアウト時に利用者ごとの状態を破棄する
    pub fn clear_user_lists(&mut self) {
        self.loans.clear();
        self.favorites.clear();
        self.waitlist.clear();
    }

    pub fn loan(&self, loan_id: LoanId) -> Option<&WithBook<Loan>> {
        self.loans.items.iter().find(|l| l.id == loan_id)
    }

    pub fn waitlist_entry(&self, entry_id: WaitlistEntryId) -> Option<&WithBook<WaitlistEntry>> {
        self.waitlist.items.iter().find(|e| e.id == entry_id)
    }

    pub fn is_favorite(&self, book_id: BookId) -> bool {
        self.favorites.items.iter().any(|f| f.book_id == book_id)
    }
}
