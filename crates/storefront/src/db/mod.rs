//! Database operations for the storefront.
//!
//! # Database: `brana`
//!
//! ## Tables (schema `storefront`)
//!
//! - `account` - Site accounts with argon2 password hashes
//! - `product` - Bilingual catalog
//! - `cart_line` - One row per (account, product) cart line
//! - `customer_order` - Placed orders with item/address snapshots
//! - `contact_message` - Contact form submissions
//! - `newsletter_subscriber` - Newsletter sign-ups
//! - `tower_sessions.session` - Session storage (created by the session store)
//!
//! Each concern is a trait (`CartStore`, `UserStore`, ...) implemented by
//! [`PgStore`] for production and by [`memory::MemoryStore`] for tests and
//! local development.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p brana-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod messages;
pub mod orders;
pub mod products;
pub mod users;

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartStore;
pub use memory::MemoryStore;
pub use messages::MessageStore;
pub use orders::OrderStore;
pub use products::ProductStore;
pub use users::UserStore;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Underlying database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Stored data failed validation when read back.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Unique constraint violated.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Row to update did not exist.
    #[error("not found")]
    NotFound,
}

/// Map a unique-violation into `Conflict`, everything else into `Database`.
pub(crate) fn map_unique_violation(err: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(err)
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

/// `PostgreSQL` implementation of every store trait.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// The set of stores the application runs against.
#[derive(Clone)]
pub struct Stores {
    pub carts: Arc<dyn CartStore>,
    pub users: Arc<dyn UserStore>,
    pub products: Arc<dyn ProductStore>,
    pub orders: Arc<dyn OrderStore>,
    pub messages: Arc<dyn MessageStore>,
}

impl Stores {
    /// Stores backed by `PostgreSQL`.
    #[must_use]
    pub fn postgres(pool: PgPool) -> Self {
        Self::from_shared(Arc::new(PgStore::new(pool)))
    }

    /// Stores backed by process memory. Data is lost on restart.
    #[must_use]
    pub fn memory() -> Self {
        Self::from_shared(Arc::new(MemoryStore::default()))
    }

    /// Use one object for every concern.
    pub fn from_shared<T>(store: Arc<T>) -> Self
    where
        T: CartStore + UserStore + ProductStore + OrderStore + MessageStore + 'static,
    {
        Self {
            carts: store.clone(),
            users: store.clone(),
            products: store.clone(),
            orders: store.clone(),
            messages: store,
        }
    }
}
