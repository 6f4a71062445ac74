pub mod selectors;
pub mod slices;
pub mod store;

pub use slices::{AuthState, BooksState, LibraryState, ListState};
pub use store::{Store, Subscription};
