//! Catalog listing and adding products to a basket.

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use shopfloor_core::{BasketId, ProductId};

use super::{NavView, render};
use crate::{
    db::{BasketRepository, ProductRepository},
    error::AppError,
    filters,
    middleware::{OptionalSession, RequireSession},
    models::Product,
    services::{Change, WorkflowError},
    state::AppState,
};

/// Outcome flags carried back to the listing after an add.
#[derive(Debug, Default, Deserialize)]
pub struct ShopQuery {
    pub notice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AddItemForm {
    pub product_id: String,
    #[serde(default = "one")]
    pub quantity: u32,
}

const fn one() -> u32 {
    1
}

#[derive(Template)]
#[template(path = "shop.html")]
pub struct ShopTemplate {
    pub nav: Option<NavView>,
    pub products: Vec<Product>,
    /// Basket the add buttons post to, when the visitor's basket takes items.
    pub basket_id: Option<String>,
    pub notice: Option<&'static str>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/shop", get(shop))
        .route("/baskets/{id}/items", post(add_item))
}

/// Message for a notice code.
fn notice_message(code: &str) -> Option<&'static str> {
    match code {
        "added" => Some("Added to your basket."),
        "closed" => Some("This basket no longer accepts products."),
        "unknown_product" => Some("That product is no longer in the catalog."),
        "invalid_quantity" => Some("Quantity must be at least 1."),
        _ => None,
    }
}

/// GET /shop
#[instrument(skip_all)]
async fn shop(
    OptionalSession(context): OptionalSession,
    State(state): State<AppState>,
    Query(query): Query<ShopQuery>,
) -> Result<Html<String>, AppError> {
    let products = ProductRepository::new(state.pool()).list_all().await?;

    let mut basket_id = None;
    if let Some(id) = context.as_ref().and_then(|ctx| ctx.basket_id.as_ref())
        && let Some(basket) = BasketRepository::new(state.pool()).get(id).await?
        && basket.status.accepts_items()
    {
        basket_id = Some(basket.id.into_inner());
    }

    Ok(render(&ShopTemplate {
        nav: context.as_ref().map(|ctx| NavView::new(ctx, "/shop")),
        products,
        basket_id,
        notice: query.notice.as_deref().and_then(notice_message),
    }))
}

/// POST /baskets/{id}/items
#[instrument(skip(context, state, form), fields(basket_id = %id))]
async fn add_item(
    RequireSession(context): RequireSession,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<AddItemForm>,
) -> Result<Redirect, AppError> {
    let basket_id = BasketId::new(id);
    if !context.can_access_basket(&basket_id) {
        return Err(AppError::Forbidden(
            "You can only add products to your own basket".to_string(),
        ));
    }

    let product_id = ProductId::new(form.product_id.trim());
    let notice = match state
        .workflow()
        .add_product(&basket_id, &product_id, form.quantity)
        .await
    {
        Ok(basket) => {
            state.live().apply(Change::Basket(basket)).await;
            "added"
        }
        Err(WorkflowError::NotAcceptingItems(_)) => "closed",
        Err(WorkflowError::ProductNotFound(_)) => "unknown_product",
        Err(WorkflowError::InvalidQuantity) => "invalid_quantity",
        Err(other) => return Err(other.into()),
    };

    Ok(Redirect::to(&format!("/shop?notice={notice}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notice_messages() {
        assert_eq!(notice_message("added"), Some("Added to your basket."));
        assert!(notice_message("closed").is_some());
        assert_eq!(notice_message("<script>"), None);
    }
}
