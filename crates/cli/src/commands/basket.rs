//! Administrative basket edits.
//!
//! # Usage
//!
//! ```bash
//! # Approve a pending basket, as the cashier board does
//! sf-cli basket approve --id basket_k3j9x0a2b
//!
//! # Move a basket along its lifecycle
//! sf-cli basket set-status --id basket_k3j9x0a2b --status completed
//!
//! # Move it anywhere, including backwards
//! sf-cli basket set-status --id basket_k3j9x0a2b --status active --force
//! ```

use shopfloor_core::{BasketId, BasketStatus};
use shopfloor_portal::services::{ApprovalOutcome, BasketWorkflow, PgBasketStore};

use super::{CommandError, connect};

/// Approve a basket waiting for a cashier.
pub async fn approve(id: &str) -> Result<(), CommandError> {
    let pool = connect().await?;
    let workflow = BasketWorkflow::new(PgBasketStore::new(pool));

    match workflow.approve(&BasketId::new(id)).await? {
        ApprovalOutcome::Approved(basket) => {
            tracing::info!("Basket {} approved, now {}", basket.id, basket.status);
        }
        ApprovalOutcome::Unchanged(status) => {
            tracing::warn!("Basket {id} was not pending approval (status: {status})");
        }
    }
    Ok(())
}

/// Set a basket's status.
pub async fn set_status(id: &str, status: &str, force: bool) -> Result<(), CommandError> {
    let next: BasketStatus = status.parse().map_err(CommandError::InvalidArgument)?;

    let pool = connect().await?;
    let workflow = BasketWorkflow::new(PgBasketStore::new(pool));

    let basket = workflow.set_status(&BasketId::new(id), next, force).await?;
    tracing::info!("Basket {} is now {}", basket.id, basket.status);
    Ok(())
}
