//! Basket repository.
//!
//! Status changes go through [`BasketRepository::compare_and_set_status`]: the
//! update only lands when the stored status still equals the expected one.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use shopfloor_core::{BasketId, BasketStatus, PaymentService, Price, ProductId};

use super::{RepositoryError, quantity_from_db};
use crate::models::{Basket, BasketItem};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(super) struct BasketRow {
    id: String,
    status: BasketStatus,
    payment_service: PaymentService,
    total_price: Price,
    revision: i64,
    updated_at: DateTime<Utc>,
}

impl From<BasketRow> for Basket {
    fn from(row: BasketRow) -> Self {
        Self {
            id: BasketId::new(row.id),
            status: row.status,
            payment_service: row.payment_service,
            total_price: row.total_price,
            revision: row.revision,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    basket_id: String,
    product_id: String,
    product_name: String,
    quantity: i32,
    price: Price,
    revision: i64,
}

impl ItemRow {
    fn into_item(self) -> Result<BasketItem, RepositoryError> {
        Ok(BasketItem {
            product_id: ProductId::new(self.product_id),
            product_name: self.product_name,
            quantity: quantity_from_db(self.quantity)?,
            price: self.price,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    status: BasketStatus,
    baskets: i64,
    total: Price,
}

const BASKET_COLUMNS: &str = "id, status, payment_service, total_price, revision, updated_at";
const ITEM_COLUMNS: &str = "basket_id, product_id, product_name, quantity, price, revision";

// =============================================================================
// Write Outcomes
// =============================================================================

/// Result of a conditional status write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusWrite {
    /// The status matched and was replaced.
    Applied(Basket),
    /// The stored status differed from the expected one; nothing changed.
    Stale(BasketStatus),
}

/// Result of adding a product to a basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemWrite {
    /// The line was added (or its quantity raised) and the total recomputed.
    Added(Basket),
    /// The basket no longer accepts products.
    Refused(BasketStatus),
    /// No catalog product carries this id.
    UnknownProduct,
}

/// Basket count and stored total for one status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub status: BasketStatus,
    pub baskets: i64,
    pub total: Price,
}

/// Line items of one basket with the newest revision among them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasketItems {
    pub basket_id: BasketId,
    pub revision: i64,
    pub items: Vec<BasketItem>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for baskets and their line items.
pub struct BasketRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BasketRepository<'a> {
    /// Create a new basket repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a basket header by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: &BasketId) -> Result<Option<Basket>, RepositoryError> {
        let row = sqlx::query_as::<_, BasketRow>(&format!(
            "SELECT {BASKET_COLUMNS} FROM baskets WHERE id = $1"
        ))
        .bind(id.as_str())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// List every basket header.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Basket>, RepositoryError> {
        let rows = sqlx::query_as::<_, BasketRow>(&format!(
            "SELECT {BASKET_COLUMNS} FROM baskets ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Line items of one basket, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a quantity is negative.
    pub async fn items(&self, id: &BasketId) -> Result<BasketItems, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM basket_products WHERE basket_id = $1 ORDER BY position"
        ))
        .bind(id.as_str())
        .fetch_all(self.pool)
        .await?;

        let revision = rows.iter().map(|row| row.revision).max().unwrap_or(0);
        let items = rows
            .into_iter()
            .map(ItemRow::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BasketItems {
            basket_id: id.clone(),
            revision,
            items,
        })
    }

    /// Line items of every basket that has any.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a quantity is negative.
    pub async fn all_items(&self) -> Result<Vec<BasketItems>, RepositoryError> {
        let rows = sqlx::query_as::<_, ItemRow>(&format!(
            "SELECT {ITEM_COLUMNS} FROM basket_products ORDER BY basket_id, position"
        ))
        .fetch_all(self.pool)
        .await?;

        let mut grouped: Vec<BasketItems> = Vec::new();
        for row in rows {
            let revision = row.revision;
            let basket_id = BasketId::new(row.basket_id.clone());
            let item = row.into_item()?;
            match grouped.last_mut() {
                Some(group) if group.basket_id == basket_id => {
                    group.revision = group.revision.max(revision);
                    group.items.push(item);
                }
                _ => grouped.push(BasketItems {
                    basket_id,
                    revision,
                    items: vec![item],
                }),
            }
        }

        Ok(grouped)
    }

    /// Replace the status only if it still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the basket does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn compare_and_set_status(
        &self,
        id: &BasketId,
        expected: BasketStatus,
        next: BasketStatus,
    ) -> Result<StatusWrite, RepositoryError> {
        let updated = sqlx::query_as::<_, BasketRow>(&format!(
            "UPDATE baskets SET status = $3, updated_at = NOW() \
             WHERE id = $1 AND status = $2 \
             RETURNING {BASKET_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(expected)
        .bind(next)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(StatusWrite::Applied(row.into()));
        }

        let current = sqlx::query_scalar::<_, BasketStatus>("SELECT status FROM baskets WHERE id = $1")
            .bind(id.as_str())
            .fetch_optional(self.pool)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        Ok(StatusWrite::Stale(current))
    }

    /// Record how the basket is paid for.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the basket does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn set_payment_service(
        &self,
        id: &BasketId,
        payment_service: PaymentService,
    ) -> Result<Basket, RepositoryError> {
        let row = sqlx::query_as::<_, BasketRow>(&format!(
            "UPDATE baskets SET payment_service = $2, updated_at = NOW() \
             WHERE id = $1 RETURNING {BASKET_COLUMNS}"
        ))
        .bind(id.as_str())
        .bind(payment_service)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }

    /// Add `quantity` units of a catalog product and recompute the total.
    ///
    /// Runs in one transaction holding a row lock on the basket, so the status
    /// check and the writes see the same basket.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the basket does not exist.
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn add_item(
        &self,
        id: &BasketId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ItemWrite, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let status =
            sqlx::query_scalar::<_, BasketStatus>("SELECT status FROM baskets WHERE id = $1 FOR UPDATE")
                .bind(id.as_str())
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(RepositoryError::NotFound)?;

        if !status.accepts_items() {
            return Ok(ItemWrite::Refused(status));
        }

        let product = sqlx::query_as::<_, (String, Price)>(
            "SELECT product_name, price FROM products WHERE product_id = $1",
        )
        .bind(product_id.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        let Some((product_name, price)) = product else {
            return Ok(ItemWrite::UnknownProduct);
        };

        let quantity = i32::try_from(quantity)
            .map_err(|_| RepositoryError::Conflict(format!("quantity too large: {quantity}")))?;

        sqlx::query(
            r"
            INSERT INTO basket_products (basket_id, product_id, product_name, quantity, price, position)
            VALUES (
                $1, $2, $3, $4, $5,
                (SELECT COALESCE(MAX(position) + 1, 0) FROM basket_products WHERE basket_id = $1)
            )
            ON CONFLICT (basket_id, product_id) DO UPDATE
            SET quantity = basket_products.quantity + EXCLUDED.quantity,
                price = EXCLUDED.price,
                product_name = EXCLUDED.product_name
            ",
        )
        .bind(id.as_str())
        .bind(product_id.as_str())
        .bind(&product_name)
        .bind(quantity)
        .bind(price)
        .execute(&mut *tx)
        .await?;

        let row = sqlx::query_as::<_, BasketRow>(&format!(
            "UPDATE baskets SET total_price = ( \
                 SELECT COALESCE(SUM(price * quantity), 0) FROM basket_products WHERE basket_id = $1 \
             ), updated_at = NOW() \
             WHERE id = $1 RETURNING {BASKET_COLUMNS}"
        ))
        .bind(id.as_str())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(ItemWrite::Added(row.into()))
    }

    /// Basket counts and stored totals grouped by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn summary_by_status(&self) -> Result<Vec<StatusSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r"
            SELECT status, COUNT(*) AS baskets, COALESCE(SUM(total_price), 0) AS total
            FROM baskets
            GROUP BY status
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| StatusSummary {
                status: row.status,
                baskets: row.baskets,
                total: row.total,
            })
            .collect())
    }
}
