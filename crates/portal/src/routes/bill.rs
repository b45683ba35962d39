//! Receipts: pick a basket, set the payment mode, print an 80mm bill.

use std::collections::HashMap;

use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use chrono::Utc;
use serde::Deserialize;
use tracing::instrument;

use shopfloor_core::{BasketId, PaymentService};

use super::{NavView, render};
use crate::{
    config::StoreInfo,
    db::{BasketRepository, RepositoryError, UserRepository},
    error::AppError,
    filters,
    middleware::RequireAdmin,
    services::{Change, bill::Bill},
    state::AppState,
};

/// Payment modes offered on the receipt page.
const PAYMENT_CHOICES: [PaymentService; 3] =
    [PaymentService::Cash, PaymentService::Card, PaymentService::Upi];

/// A basket in the billing list.
#[derive(Debug, Clone)]
pub struct BillableView {
    pub basket_id: String,
    pub customer: String,
    pub phone: String,
    pub status: &'static str,
    pub payment: &'static str,
    pub total: String,
}

#[derive(Template)]
#[template(path = "bill/list.html")]
pub struct BillListTemplate {
    pub nav: NavView,
    pub baskets: Vec<BillableView>,
}

/// A payment mode option on the receipt page.
#[derive(Debug, Clone)]
pub struct PaymentChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "bill/receipt.html")]
pub struct ReceiptTemplate {
    pub store: StoreInfo,
    pub basket_id: String,
    pub bill: Bill,
    pub issued: String,
    pub payment_choices: Vec<PaymentChoice>,
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/bill", get(bill_list))
        .route("/bill/{id}", get(receipt))
        .route("/bill/{id}/payment", post(set_payment))
}

/// GET /bill
#[instrument(skip_all)]
async fn bill_list(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let pool = state.pool();
    let users = UserRepository::new(pool).list_all().await?;
    let baskets: HashMap<BasketId, _> = BasketRepository::new(pool)
        .list_all()
        .await?
        .into_iter()
        .map(|basket| (basket.id.clone(), basket))
        .collect();

    let listed = users
        .into_iter()
        .filter_map(|user| {
            let basket = baskets.get(&user.basket_id)?;
            Some(BillableView {
                basket_id: basket.id.to_string(),
                customer: user.name,
                phone: user.phone,
                status: basket.status.label(),
                payment: basket.payment_service.label(),
                total: basket.total_price.display(),
            })
        })
        .collect();

    Ok(render(&BillListTemplate {
        nav: NavView::new(&admin, "/bill"),
        baskets: listed,
    }))
}

/// GET /bill/{id}
#[instrument(skip(state, _admin), fields(basket_id = %id))]
async fn receipt(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, AppError> {
    let basket_id = BasketId::new(id);
    let pool = state.pool();
    let baskets = BasketRepository::new(pool);

    let basket = baskets
        .get(&basket_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("basket {basket_id}")))?;
    let items = baskets.items(&basket_id).await?.items;

    let print = &state.config().print;
    let issued_at = Utc::now();
    let mut bill = Bill::new(&items, print.bill_discount_percent, basket.payment_service, issued_at);
    if let Some(user) = UserRepository::new(pool).find_by_basket(&basket_id).await? {
        bill = bill.with_customer(user.name, user.phone);
    }

    Ok(render(&ReceiptTemplate {
        store: print.store.clone(),
        basket_id: basket_id.into_inner(),
        issued: issued_at.format("%d/%m/%Y %H:%M").to_string(),
        payment_choices: PAYMENT_CHOICES
            .iter()
            .map(|&choice| PaymentChoice {
                value: payment_value(choice),
                label: choice.label(),
                selected: choice == bill.payment_mode,
            })
            .collect(),
        bill,
    }))
}

/// POST /bill/{id}/payment
#[instrument(skip(state, _admin, form), fields(basket_id = %id))]
async fn set_payment(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect, AppError> {
    let basket_id = BasketId::new(id);
    let payment: PaymentService = form.payment.parse().map_err(AppError::BadRequest)?;

    let basket = BasketRepository::new(state.pool())
        .set_payment_service(&basket_id, payment)
        .await
        .map_err(|err| match err {
            RepositoryError::NotFound => AppError::NotFound(format!("basket {basket_id}")),
            other => AppError::Database(other),
        })?;
    tracing::info!(payment = %payment, "Payment mode recorded");
    state.live().apply(Change::Basket(basket)).await;

    Ok(Redirect::to(&format!("/bill/{basket_id}")))
}

/// Form value for a payment mode.
const fn payment_value(payment: PaymentService) -> &'static str {
    match payment {
        PaymentService::None => "none",
        PaymentService::Cash => "cash",
        PaymentService::Card => "card",
        PaymentService::Upi => "upi",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_values_parse_back() {
        for choice in PAYMENT_CHOICES {
            assert_eq!(payment_value(choice).parse::<PaymentService>(), Ok(choice));
        }
    }
}
