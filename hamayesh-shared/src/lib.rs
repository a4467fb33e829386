//! # Hamayesh Shared Library
//!
//! Domain logic of the conference administration backend, used by the API
//! server.
//!
//! ## Module Organization
//!
//! - `models`: Database rows and their sqlx queries
//! - `db`: Connection pool, migrations and database bootstrap
//! - `store`: The `EntityStore` trait with PostgreSQL and in-memory backends
//! - `filter`: Conference-scoped task eligibility and the task widget state
//! - `assignment`: Propagation of category task edits to member assignments
//! - `auth`: Bearer token validation
//! - `error`: Domain error type

pub mod assignment;
pub mod auth;
pub mod db;
pub mod error;
pub mod filter;
pub mod models;
pub mod store;

/// Current version of the Hamayesh shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
