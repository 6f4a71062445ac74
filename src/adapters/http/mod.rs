pub mod auth_provider;
pub mod catalog;

pub use auth_provider::AuthProvider as HttpAuthProvider;
pub use catalog::Catalog as HttpCatalog;
