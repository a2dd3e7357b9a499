//! Movie Catalog Module
//! Mission: CRUD for directors, movies, and user administration

pub mod api;
pub mod models;
pub mod store;
pub mod users_api;

pub use store::CatalogStore;
