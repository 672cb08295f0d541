//! Database operations for the storefront `PostgreSQL` database.
//!
//! # Schema: `storefront`
//!
//! - `user`, `user_password`, `password_reset_token` - accounts
//! - `category`, `product`, `banner` - catalog managed from the back-office
//! - `cart_item`, `watchlist` - per-user state
//! - `order`, `order_item` - placed orders with their price snapshot
//! - `setting` - key/value store (UPI payment details)
//!
//! Sessions live in `tower_sessions.session`.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p loomline-cli -- migrate
//! ```

pub mod banners;
pub mod cart;
pub mod categories;
pub mod orders;
pub mod products;
pub mod settings;
pub mod users;
pub mod watchlist;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use banners::BannerRepository;
pub use cart::{CartRepository, MAX_LINE_QUANTITY};
pub use categories::CategoryRepository;
pub use orders::{CartCheckout, OrderRepository};
pub use products::ProductRepository;
pub use settings::SettingsRepository;
pub use users::UserRepository;
pub use watchlist::WatchlistRepository;

/// Errors from repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// The write would break a limit the caller can fix.
    #[error("invalid: {0}")]
    Invalid(String),
}

/// Map unique-constraint violations to [`RepositoryError::Conflict`].
///
/// `describe` turns the violated constraint's name into a user-facing message.
pub(crate) fn map_unique_violation(
    e: sqlx::Error,
    describe: impl FnOnce(Option<&str>) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(describe(db_err.constraint()));
    }
    RepositoryError::Database(e)
}

/// Map foreign-key violations (e.g. an unknown product id) to [`RepositoryError::NotFound`].
pub(crate) fn map_foreign_key_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

/// Convert a stored quantity to the domain type.
pub(crate) fn quantity_from_db(quantity: i32) -> Result<u32, RepositoryError> {
    u32::try_from(quantity)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity: {quantity}")))
}

/// Convert a domain quantity for storage.
pub(crate) fn quantity_to_db(quantity: u32) -> Result<i32, RepositoryError> {
    i32::try_from(quantity)
        .map_err(|_| RepositoryError::Conflict(format!("quantity {quantity} is too large")))
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_conversions() {
        assert_eq!(quantity_from_db(3).ok(), Some(3));
        assert!(matches!(
            quantity_from_db(-1),
            Err(RepositoryError::DataCorruption(_))
        ));
        assert_eq!(quantity_to_db(12).ok(), Some(12));
        assert!(matches!(
            quantity_to_db(u32::MAX),
            Err(RepositoryError::Conflict(_))
        ));
    }

    #[test]
    fn test_non_database_errors_pass_through() {
        let mapped = map_unique_violation(sqlx::Error::RowNotFound, |_| "dup".to_owned());
        assert!(matches!(mapped, RepositoryError::Database(_)));
        assert!(matches!(
            map_foreign_key_violation(sqlx::Error::RowNotFound),
            RepositoryError::Database(_)
        ));
    }
}
