//! Signed-in customer's landing page.

use askama::Template;
use axum::{Router, extract::State, response::Html, routing::get};
use tracing::instrument;

use super::{NavView, render};
use crate::{
    db::BasketRepository,
    error::AppError,
    filters,
    middleware::RequireSession,
    models::{Basket, BasketItem},
    state::AppState,
};

/// The customer's basket as shown on the home page.
#[derive(Debug, Clone)]
pub struct BasketView {
    pub id: String,
    pub status: String,
    pub is_pending: bool,
    pub accepts_items: bool,
    pub payment: String,
    pub total: String,
    pub items: Vec<BasketItem>,
}

impl BasketView {
    fn new(basket: &Basket, items: Vec<BasketItem>) -> Self {
        Self {
            id: basket.id.to_string(),
            status: basket.status.label().to_string(),
            is_pending: basket.status.approve().is_some(),
            accepts_items: basket.status.accepts_items(),
            payment: basket.payment_service.label().to_string(),
            total: basket.total_price.display(),
            items,
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub nav: NavView,
    pub basket: Option<BasketView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

/// GET /home
#[instrument(skip(context, state))]
async fn home(
    RequireSession(context): RequireSession,
    State(state): State<AppState>,
) -> Result<Html<String>, AppError> {
    let basket = match &context.basket_id {
        Some(basket_id) => {
            let repo = BasketRepository::new(state.pool());
            match repo.get(basket_id).await? {
                Some(basket) => {
                    let items = repo.items(basket_id).await?.items;
                    Some(BasketView::new(&basket, items))
                }
                None => {
                    tracing::warn!(basket_id = %basket_id, "Session names a missing basket");
                    None
                }
            }
        }
        None => None,
    };

    Ok(render(&HomeTemplate {
        nav: NavView::new(&context, "/home"),
        basket,
    }))
}
