//! Database operations for the portal `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Registered customers, one basket each
//! - `baskets` - Basket headers with status, payment service and stored total
//! - `basket_products` - Basket line items, ordered by `position`
//! - `products` - Catalog, keyed by the external `product_id`
//! - `portal.session` - Session storage for tower-sessions
//!
//! Every write to `users`, `baskets` or `basket_products` stamps a fresh
//! `revision` from one sequence and publishes a notification on
//! [`CHANGE_CHANNEL`].
//!
//! # Migrations
//!
//! Migrations are stored in `crates/portal/migrations/` and run via:
//! ```bash
//! cargo run -p shopfloor-cli -- migrate
//! ```

pub mod baskets;
pub mod products;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use baskets::{BasketItems, BasketRepository, ItemWrite, StatusSummary, StatusWrite};
pub use products::ProductRepository;
pub use users::UserRepository;

/// Channel the change triggers publish on.
pub const CHANGE_CHANNEL: &str = "shopfloor_changes";

/// Errors that can occur during repository operations.
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

    /// Constraint violation (e.g., duplicate id).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

impl RepositoryError {
    /// Map unique-constraint violations to [`RepositoryError::Conflict`].
    pub(crate) fn from_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err
            && db_err.is_unique_violation()
        {
            return Self::Conflict(db_err.message().to_string());
        }
        Self::Database(err)
    }
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

/// Convert a stored integer quantity into a line quantity.
pub(crate) fn quantity_from_db(value: i32) -> Result<u32, RepositoryError> {
    u32::try_from(value)
        .map_err(|_| RepositoryError::DataCorruption(format!("negative quantity: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_from_db() {
        assert_eq!(quantity_from_db(3).ok(), Some(3));
        assert!(matches!(
            quantity_from_db(-1),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
