//! Basket workflow.
//!
//! Registers customers with their basket, approves pending baskets and
//! applies administrative status edits and product adds. Persistence sits
//! behind [`BasketStore`]; [`PgBasketStore`] is the production store.

use std::future::Future;

use chrono::Utc;
use rand::Rng;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use shopfloor_core::{BasketId, BasketStatus, ProductId, UserId};

use crate::db::{BasketRepository, ItemWrite, RepositoryError, StatusWrite, UserRepository};
use crate::models::{Basket, User};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const BASKET_SUFFIX_LEN: usize = 9;
const USER_SUFFIX_LEN: usize = 4;
const REGISTRATION_ATTEMPTS: usize = 3;

/// Errors raised by basket workflow operations.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("basket {0} not found")]
    BasketNotFound(BasketId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// An administrative edit that is not a forward lifecycle move.
    #[error("cannot move basket from {from} to {to}")]
    InvalidTransition { from: BasketStatus, to: BasketStatus },

    /// The basket changed status between read and write.
    #[error("basket status changed from {expected} to {found}; reload and retry")]
    StatusChanged {
        expected: BasketStatus,
        found: BasketStatus,
    },

    #[error("basket is {0} and no longer accepts products")]
    NotAcceptingItems(BasketStatus),

    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A freshly registered customer and their empty basket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub user: User,
    pub basket: Basket,
}

/// Result of a cashier approval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The basket moved from pending to active.
    Approved(Basket),
    /// The basket was not pending; it was left as it is.
    Unchanged(BasketStatus),
}

/// Persistence used by the workflow.
pub trait BasketStore: Send + Sync {
    /// Write a user and its pending, empty basket atomically.
    fn register(
        &self,
        user_id: &UserId,
        name: &str,
        phone: &str,
        basket_id: &BasketId,
    ) -> impl Future<Output = Result<(User, Basket), RepositoryError>> + Send;

    fn basket(
        &self,
        id: &BasketId,
    ) -> impl Future<Output = Result<Option<Basket>, RepositoryError>> + Send;

    /// Replace the status only if it still equals `expected`.
    fn compare_and_set_status(
        &self,
        id: &BasketId,
        expected: BasketStatus,
        next: BasketStatus,
    ) -> impl Future<Output = Result<StatusWrite, RepositoryError>> + Send;

    fn add_item(
        &self,
        id: &BasketId,
        product_id: &ProductId,
        quantity: u32,
    ) -> impl Future<Output = Result<ItemWrite, RepositoryError>> + Send;
}

/// [`BasketStore`] backed by the portal database.
#[derive(Debug, Clone)]
pub struct PgBasketStore {
    pool: PgPool,
}

impl PgBasketStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl BasketStore for PgBasketStore {
    async fn register(
        &self,
        user_id: &UserId,
        name: &str,
        phone: &str,
        basket_id: &BasketId,
    ) -> Result<(User, Basket), RepositoryError> {
        UserRepository::new(&self.pool)
            .create_with_basket(user_id, name, phone, basket_id)
            .await
    }

    async fn basket(&self, id: &BasketId) -> Result<Option<Basket>, RepositoryError> {
        BasketRepository::new(&self.pool).get(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: &BasketId,
        expected: BasketStatus,
        next: BasketStatus,
    ) -> Result<StatusWrite, RepositoryError> {
        BasketRepository::new(&self.pool)
            .compare_and_set_status(id, expected, next)
            .await
    }

    async fn add_item(
        &self,
        id: &BasketId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ItemWrite, RepositoryError> {
        BasketRepository::new(&self.pool)
            .add_item(id, product_id, quantity)
            .await
    }
}

/// Basket lifecycle operations over a [`BasketStore`].
#[derive(Debug, Clone)]
pub struct BasketWorkflow<S> {
    store: S,
}

impl<S: BasketStore> BasketWorkflow<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Create a customer record and its basket in one write.
    ///
    /// Fresh ids are drawn again if a generated id is already taken.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Repository` if the write fails.
    #[instrument(skip(self, phone))]
    pub async fn register(&self, name: &str, phone: &str) -> Result<Registration, WorkflowError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let (user_id, basket_id) = new_registration_ids();
            match self.store.register(&user_id, name, phone, &basket_id).await {
                Ok((user, basket)) => {
                    tracing::info!(
                        user_id = %user.id,
                        basket_id = %basket.id,
                        "Customer registered"
                    );
                    return Ok(Registration { user, basket });
                }
                Err(RepositoryError::Conflict(detail)) if attempt < REGISTRATION_ATTEMPTS => {
                    tracing::warn!(%detail, attempt, "Generated id already taken, retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Approve a pending basket.
    ///
    /// A basket in any other status is left untouched and its status
    /// reported back.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::BasketNotFound` for an unknown basket.
    #[instrument(skip(self), fields(basket_id = %id))]
    pub async fn approve(&self, id: &BasketId) -> Result<ApprovalOutcome, WorkflowError> {
        let write = self
            .store
            .compare_and_set_status(id, BasketStatus::PendingCashierApproval, BasketStatus::Active)
            .await
            .map_err(|err| not_found_as(err, id))?;

        match write {
            StatusWrite::Applied(basket) => {
                tracing::info!("Basket approved");
                Ok(ApprovalOutcome::Approved(basket))
            }
            StatusWrite::Stale(current) => {
                tracing::info!(status = %current, "Approval skipped, basket not pending");
                Ok(ApprovalOutcome::Unchanged(current))
            }
        }
    }

    /// Administrative status edit.
    ///
    /// Only forward lifecycle moves are accepted unless `force` is set.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::InvalidTransition` for a backward move,
    /// `WorkflowError::StatusChanged` if another write got there first.
    #[instrument(skip(self), fields(basket_id = %id))]
    pub async fn set_status(
        &self,
        id: &BasketId,
        next: BasketStatus,
        force: bool,
    ) -> Result<Basket, WorkflowError> {
        let basket = self
            .store
            .basket(id)
            .await?
            .ok_or_else(|| WorkflowError::BasketNotFound(id.clone()))?;

        if basket.status == next {
            return Ok(basket);
        }
        if !force && !basket.status.can_transition_to(next) {
            return Err(WorkflowError::InvalidTransition {
                from: basket.status,
                to: next,
            });
        }

        match self
            .store
            .compare_and_set_status(id, basket.status, next)
            .await
            .map_err(|err| not_found_as(err, id))?
        {
            StatusWrite::Applied(updated) => {
                tracing::info!(from = %basket.status, to = %next, "Basket status edited");
                Ok(updated)
            }
            StatusWrite::Stale(found) => Err(WorkflowError::StatusChanged {
                expected: basket.status,
                found,
            }),
        }
    }

    /// Add catalog products to a basket that still accepts them.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::NotAcceptingItems` once the basket is
    /// `Completed` or `Inactive`, `WorkflowError::ProductNotFound` for an
    /// unknown product.
    #[instrument(skip(self), fields(basket_id = %id, product_id = %product_id))]
    pub async fn add_product(
        &self,
        id: &BasketId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<Basket, WorkflowError> {
        if quantity == 0 {
            return Err(WorkflowError::InvalidQuantity);
        }

        match self
            .store
            .add_item(id, product_id, quantity)
            .await
            .map_err(|err| not_found_as(err, id))?
        {
            ItemWrite::Added(basket) => Ok(basket),
            ItemWrite::Refused(status) => Err(WorkflowError::NotAcceptingItems(status)),
            ItemWrite::UnknownProduct => Err(WorkflowError::ProductNotFound(product_id.clone())),
        }
    }
}

fn not_found_as(err: RepositoryError, id: &BasketId) -> WorkflowError {
    match err {
        RepositoryError::NotFound => WorkflowError::BasketNotFound(id.clone()),
        other => WorkflowError::Repository(other),
    }
}

/// Draw a `user_<millis>_<suffix>` / `basket_<suffix>` id pair.
#[must_use]
pub fn new_registration_ids() -> (UserId, BasketId) {
    let mut rng = rand::rng();
    let user_id = UserId::new(format!(
        "user_{}_{}",
        Utc::now().timestamp_millis(),
        random_suffix(&mut rng, USER_SUFFIX_LEN)
    ));
    let basket_id = BasketId::new(format!(
        "basket_{}",
        random_suffix(&mut rng, BASKET_SUFFIX_LEN)
    ));
    (user_id, basket_id)
}

fn random_suffix(rng: &mut impl Rng, len: usize) -> String {
    (0..len)
        .map(|_| char::from(ID_ALPHABET[rng.random_range(0..ID_ALPHABET.len())]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_id_shapes() {
        let (user_id, basket_id) = new_registration_ids();

        let suffix = basket_id.as_str().strip_prefix("basket_").unwrap_or_default();
        assert_eq!(suffix.len(), BASKET_SUFFIX_LEN);
        assert!(suffix.bytes().all(|b| ID_ALPHABET.contains(&b)));

        let rest = user_id.as_str().strip_prefix("user_").unwrap_or_default();
        let (millis, user_suffix) = rest.split_once('_').unwrap_or_default();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(user_suffix.len(), USER_SUFFIX_LEN);
    }

    #[test]
    fn test_registration_ids_differ() {
        let (_, a) = new_registration_ids();
        let (_, b) = new_registration_ids();
        assert_ne!(a, b);
    }
}
