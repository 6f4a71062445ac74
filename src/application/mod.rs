mod catalog_service;
mod errors;
mod favorite_service;
mod loan_service;
mod session_gate;
mod waitlist_service;

use crate::domain::LoanPolicy;
use crate::ports::*;
use std::sync::Arc;

pub use catalog_service::{get_book, search_books};
pub use errors::{ErrorKind, LibraryApplicationError, Result};
pub use favorite_service::{list_favorites, toggle_favorite};
pub use loan_service::{create_loan, list_loans, return_loan};
pub use session_gate::{authenticate_token, resolve_identity, sign_in, sign_out, sign_up};
pub use waitlist_service::{join_waitlist, list_waitlist, remove_waitlist};

/// サービスの依存関係
///
/// 振る舞いは持たず、各ユースケース関数に明示的に渡す。
/// テストではモックアダプター、本番ではPostgreSQL・HTTPアダプターを注入する。
#[derive(Clone)]
pub struct ServiceDependencies {
    pub catalog: Arc<dyn Catalog>,
    pub auth: Arc<dyn AuthProvider>,
    pub loan_store: Arc<dyn LoanStore>,
    pub favorite_store: Arc<dyn FavoriteStore>,
    pub waitlist_store: Arc<dyn WaitlistStore>,
    pub loan_policy: LoanPolicy,
}
