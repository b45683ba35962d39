//! User repository.
//!
//! Registration writes the user and its basket in one transaction, so a user
//! row never exists without the basket it points at.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopfloor_core::{BasketId, BasketStatus, PaymentService, Price, UserId};

use super::RepositoryError;
use super::baskets::BasketRow;
use crate::models::{Basket, User};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: String,
    name: String,
    phone: String,
    basket_id: String,
    revision: i64,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            phone: row.phone,
            basket_id: BasketId::new(row.basket_id),
            revision: row.revision,
            created_at: row.created_at,
        }
    }
}

const USER_COLUMNS: &str = "id, name, phone, basket_id, revision, created_at";

// =============================================================================
// Repository
// =============================================================================

/// Repository for customer records.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a user and its empty basket atomically.
    ///
    /// The basket starts in `Pending cashier approval` with a zero total and
    /// no payment service.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if either id is already taken.
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn create_with_basket(
        &self,
        user_id: &UserId,
        name: &str,
        phone: &str,
        basket_id: &BasketId,
    ) -> Result<(User, Basket), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let basket_row = sqlx::query_as::<_, BasketRow>(
            r"
            INSERT INTO baskets (id, status, payment_service, total_price)
            VALUES ($1, $2, $3, $4)
            RETURNING id, status, payment_service, total_price, revision, updated_at
            ",
        )
        .bind(basket_id.as_str())
        .bind(BasketStatus::PendingCashierApproval)
        .bind(PaymentService::None)
        .bind(Price::ZERO)
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_insert)?;

        let user_row = sqlx::query_as::<_, UserRow>(&format!(
            "INSERT INTO users (id, name, phone, basket_id) VALUES ($1, $2, $3, $4) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id.as_str())
        .bind(name)
        .bind(phone)
        .bind(basket_id.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(RepositoryError::from_insert)?;

        tx.commit().await?;

        Ok((user_row.into(), basket_row.into()))
    }

    /// Get a user by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Get the user who owns a basket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_basket(&self, basket_id: &BasketId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE basket_id = $1"
        ))
        .bind(basket_id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List every user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Count registered users.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self) -> Result<i64, RepositoryError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}
