//! Dashboard route handler.

use askama::Template;
use axum::{Router, extract::State, response::Html, routing::get};
use tracing::instrument;

use shopfloor_core::{BasketStatus, Price};

use super::{NavView, render};
use crate::{
    db::{BasketRepository, ProductRepository, StatusSummary, UserRepository},
    filters,
    middleware::RequireAdmin,
    state::AppState,
};

/// Dashboard metrics.
#[derive(Debug, Clone)]
pub struct DashboardMetrics {
    pub customers: String,
    pub products: String,
    pub pending: String,
    pub sales: Price,
}

impl Default for DashboardMetrics {
    fn default() -> Self {
        Self {
            customers: "0".to_string(),
            products: "0".to_string(),
            pending: "0".to_string(),
            sales: Price::ZERO,
        }
    }
}

/// One line of the per-status table.
#[derive(Debug, Clone)]
pub struct StatusLineView {
    pub label: &'static str,
    pub baskets: i64,
    pub total: Price,
}

impl From<&StatusSummary> for StatusLineView {
    fn from(summary: &StatusSummary) -> Self {
        Self {
            label: summary.status.label(),
            baskets: summary.baskets,
            total: summary.total,
        }
    }
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub nav: NavView,
    pub metrics: DashboardMetrics,
    pub statuses: Vec<StatusLineView>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/dashboard", get(dashboard))
}

/// Fold the per-status summary into the headline metrics.
fn headline(summary: &[StatusSummary], customers: i64, products: i64) -> DashboardMetrics {
    let count_of = |status: BasketStatus| {
        summary
            .iter()
            .find(|line| line.status == status)
            .map_or(0, |line| line.baskets)
    };
    let sales = summary
        .iter()
        .filter(|line| line.status == BasketStatus::Completed)
        .map(|line| line.total)
        .sum();

    DashboardMetrics {
        customers: customers.to_string(),
        products: products.to_string(),
        pending: count_of(BasketStatus::PendingCashierApproval).to_string(),
        sales,
    }
}

/// Display the dashboard.
#[instrument(skip(admin, state))]
pub async fn dashboard(RequireAdmin(admin): RequireAdmin, State(state): State<AppState>) -> Html<String> {
    let pool = state.pool();

    let summary = BasketRepository::new(pool)
        .summary_by_status()
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Failed to summarise baskets: {e}");
            Vec::new()
        });

    let customers = UserRepository::new(pool).count().await.unwrap_or_else(|e| {
        tracing::error!("Failed to count customers: {e}");
        0
    });

    let products = ProductRepository::new(pool).count().await.unwrap_or_else(|e| {
        tracing::error!("Failed to count products: {e}");
        0
    });

    render(&DashboardTemplate {
        nav: NavView::new(&admin, "/dashboard"),
        metrics: headline(&summary, customers, products),
        statuses: summary.iter().map(StatusLineView::from).collect(),
    })
}
