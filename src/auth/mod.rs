//! Authentication Module
//! Mission: Secure API access with JWT tokens, RBAC, and token revocation

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod password;
pub mod revocation;
pub mod user_store;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::{auth_middleware, AuthGate};
pub use revocation::{MemoryRevocationStore, RevocationStore, SqliteRevocationStore};
pub use user_store::UserStore;
