//! Catalog and account storage for the storefront.
//!
//! # Database: `shopfront`
//!
//! ## Tables
//!
//! - `storefront.product` - The purchasable catalog (read-only to the web app)
//! - `storefront.user` - Accounts (unique username + argon2 password hash)
//! - `tower_sessions.session` - Session records (created by the session store)
//!
//! The web app only talks to storage through the [`Catalog`] and [`UserStore`]
//! traits, so handlers and services run unchanged against `PostgreSQL` or the
//! in-memory stores used by tests and local demos.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p shopfront-cli -- migrate
//! ```

pub mod cache;
pub mod memory;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use shopfront_core::{ProductId, Username};

use crate::models::product::Product;
use crate::models::user::{User, UserCredentials};

pub use cache::CachedCatalog;
pub use memory::{MemoryCatalog, MemoryUserStore};
pub use products::PgCatalog;
pub use users::PgUserStore;

/// Errors from catalog and account storage.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A uniqueness constraint was violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data failed domain validation.
    #[error("data corruption: {0}")]
    DataCorruption(String),
}

/// Read-only product lookup.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// All products, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing store cannot be read.
    async fn list_products(&self) -> Result<Vec<Product>, RepositoryError>;

    /// Look up a single product; `Ok(None)` when it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing store cannot be read.
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
}

/// Account lookup and creation.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user together with their password hash.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backing store cannot be read.
    async fn find_credentials(
        &self,
        username: &Username,
    ) -> Result<Option<UserCredentials>, RepositoryError>;

    /// Create a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username already exists.
    async fn create(&self, username: &Username, password_hash: &str)
    -> Result<User, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique-violation into `RepositoryError::Conflict`.
pub(crate) fn map_unique_violation(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}
