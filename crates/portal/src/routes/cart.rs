//! Cashier board: basket listing, live updates and approval.

use std::convert::Infallible;

use askama::Template;
use axum::{
    Router,
    extract::{Path, Query, State},
    response::{
        Html, Redirect, Sse,
        sse::{Event, KeepAlive},
    },
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use shopfloor_core::{BasketId, BasketStatus};

use super::{NavView, render};
use crate::{
    filters,
    middleware::{RequireAdmin, RequireSession},
    models::SessionContext,
    services::{ApprovalOutcome, BoardRow, Change},
    state::AppState,
};

/// Query parameters carrying the outcome of an approval.
#[derive(Debug, Default, Deserialize)]
pub struct CartQuery {
    pub notice: Option<String>,
    pub status: Option<String>,
}

/// One basket row as rendered and streamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartRowView {
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub basket_id: String,
    pub status: &'static str,
    pub payment: &'static str,
    pub total: String,
    pub item_count: u32,
    pub can_approve: bool,
}

impl From<&BoardRow> for CartRowView {
    fn from(row: &BoardRow) -> Self {
        Self {
            user_id: row.user_id.to_string(),
            name: row.name.clone(),
            phone: row.phone.clone(),
            basket_id: row.basket_id.to_string(),
            status: row.status_label(),
            payment: row.payment_service.label(),
            total: row.total_price.display(),
            item_count: row.item_count,
            can_approve: row.can_approve(),
        }
    }
}

#[derive(Template)]
#[template(path = "cart.html")]
pub struct CartTemplate {
    pub nav: NavView,
    pub is_admin: bool,
    pub rows: Vec<CartRowView>,
    pub notice: Option<String>,
    pub failed: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/cart", get(cart))
        .route("/cart/events", get(cart_events))
        .route("/cart/{id}/approve", post(approve))
}

/// Rows the visitor may see: every row for an admin, only their own basket
/// otherwise.
#[must_use]
pub fn visible_rows(rows: &[BoardRow], context: &SessionContext) -> Vec<CartRowView> {
    rows.iter()
        .filter(|row| {
            context.is_admin()
                || context.user_id.as_ref() == Some(&row.user_id)
                || context.basket_id.as_ref() == Some(&row.basket_id)
        })
        .map(CartRowView::from)
        .collect()
}

/// Banner text for an approval outcome.
fn notice_text(query: &CartQuery) -> Option<(String, bool)> {
    match query.notice.as_deref()? {
        "approved" => Some(("Basket approved successfully!".to_string(), false)),
        "unchanged" => {
            let status = query
                .status
                .as_deref()
                .and_then(|s| s.parse::<BasketStatus>().ok())
                .map_or("changed", BasketStatus::label);
            Some((format!("Basket was not pending approval ({status})."), false))
        }
        "failed" => Some(("Approval failed!".to_string(), true)),
        _ => None,
    }
}

/// GET /cart
#[instrument(skip_all)]
async fn cart(
    RequireSession(context): RequireSession,
    State(state): State<AppState>,
    Query(query): Query<CartQuery>,
) -> Html<String> {
    let rows = visible_rows(&state.live().rows().await, &context);
    let (notice, failed) = notice_text(&query).map_or((None, false), |(text, failed)| (Some(text), failed));

    render(&CartTemplate {
        nav: NavView::new(&context, "/cart"),
        is_admin: context.is_admin(),
        rows,
        notice,
        failed,
    })
}

/// GET /cart/events
///
/// Sends the visible rows once on connect and again after every board
/// change.
async fn cart_events(
    RequireSession(context): RequireSession,
    State(state): State<AppState>,
) -> Sse<impl futures::Stream<Item = Result<Event, Infallible>>> {
    let live = state.live().clone();
    let mut changes = live.subscribe();

    let stream = async_stream::stream! {
        loop {
            let rows = visible_rows(&live.rows().await, &context);
            let json = serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string());
            yield Ok(Event::default().event("board").data(json));

            if changes.changed().await.is_err() {
                break;
            }
        }
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /cart/{id}/approve
#[instrument(skip(state, _admin), fields(basket_id = %id))]
async fn approve(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Redirect {
    let basket_id = BasketId::new(id);

    match state.workflow().approve(&basket_id).await {
        Ok(ApprovalOutcome::Approved(basket)) => {
            state.live().apply(Change::Basket(basket)).await;
            Redirect::to("/cart?notice=approved")
        }
        Ok(ApprovalOutcome::Unchanged(status)) => Redirect::to(&format!(
            "/cart?notice=unchanged&status={}",
            status.as_str()
        )),
        Err(err) => {
            tracing::error!(error = %err, "Approval failed");
            Redirect::to("/cart?notice=failed")
        }
    }
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use shopfloor_core::{PaymentService, Price, UserId};

    use super::*;

    fn row(user: &str, basket: &str, status: Option<BasketStatus>) -> BoardRow {
        BoardRow {
            user_id: UserId::new(user),
            name: format!("{user} name"),
            phone: "555".to_string(),
            basket_id: BasketId::new(basket),
            status,
            payment_service: PaymentService::None,
            total_price: Price::ZERO,
            item_count: 0,
            items: Vec::new(),
        }
    }

    #[test]
    fn test_admin_sees_every_row() {
        let rows = [
            row("u1", "b1", Some(BasketStatus::PendingCashierApproval)),
            row("u2", "b2", Some(BasketStatus::Active)),
        ];
        let visible = visible_rows(&rows, &SessionContext::admin("Admin"));
        assert_eq!(visible.len(), 2);
        assert!(visible[0].can_approve);
        assert!(!visible[1].can_approve);
    }

    #[test]
    fn test_customer_sees_only_own_basket() {
        let rows = [row("u1", "b1", None), row("u2", "b2", None)];
        let context = SessionContext::customer(UserId::new("u2"), BasketId::new("b2"), "Bo");
        let visible = visible_rows(&rows, &context);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].basket_id, "b2");
        assert_eq!(visible[0].status, "Loading");
    }

    #[test]
    fn test_notice_text() {
        let approved = CartQuery {
            notice: Some("approved".to_string()),
            status: None,
        };
        assert_eq!(
            notice_text(&approved),
            Some(("Basket approved successfully!".to_string(), false))
        );

        let unchanged = CartQuery {
            notice: Some("unchanged".to_string()),
            status: Some("active".to_string()),
        };
        let (text, failed) = notice_text(&unchanged).unwrap_or_default();
        assert!(text.contains("Active"));
        assert!(!failed);

        let failed = CartQuery {
            notice: Some("failed".to_string()),
            status: None,
        };
        assert_eq!(notice_text(&failed).map(|(_, f)| f), Some(true));
        assert_eq!(notice_text(&CartQuery::default()), None);
    }
}
