pub mod auth_provider;
pub mod catalog;
pub mod favorite_store;
pub mod loan_store;
pub mod waitlist_store;

pub use auth_provider::AuthProvider;
pub use catalog::Catalog;
pub use favorite_store::FavoriteStore;
pub use loan_store::LoanStore;
pub use waitlist_store::WaitlistStore;
