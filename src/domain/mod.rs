pub mod book;
pub mod favorite;
pub mod loan;
pub mod session;
pub mod value_objects;
pub mod waitlist;

pub use book::{Author, Book, BookPage, CatalogQuery, CatalogSort, WithBook};
pub use favorite::{Favorite, FavoriteToggle};
pub use loan::{Loan, LoanPolicy};
pub use session::{AuthEvent, AuthEventKind, AuthUser, Credentials, Session, SignUp};
pub use value_objects::*;
pub use waitlist::WaitlistEntry;
