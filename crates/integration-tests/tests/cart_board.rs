//! Cashier board kept current from workflow results.

use shopfloor_core::{BasketStatus, ProductId};
use shopfloor_integration_tests::{MemoryBasketStore, product};
use shopfloor_portal::models::SessionContext;
use shopfloor_portal::routes::cart::visible_rows;
use shopfloor_portal::services::{ApprovalOutcome, BasketWorkflow, Change, LiveBoard};

#[tokio::test]
async fn test_registration_then_approval_shows_on_board() {
    let workflow = BasketWorkflow::new(
        MemoryBasketStore::new().with_product(product("P1", "Organic Rice (1kg)", 12_000)),
    );
    let live = LiveBoard::new();
    let mut changes = live.subscribe();

    let registration = workflow.register("Asha", "5550101").await.expect("register");
    let basket_id = registration.basket.id.clone();
    live.apply(Change::User(registration.user.clone())).await;

    // Until the basket arrives the row is shown as loading.
    let rows = live.rows().await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows.first().map(|row| row.status_label()), Some("Loading"));

    live.apply(Change::Basket(registration.basket)).await;
    assert!(changes.has_changed().unwrap_or(false));
    let _ = changes.borrow_and_update();

    let rows = live.rows().await;
    assert!(rows.first().is_some_and(|row| row.can_approve()));

    let ApprovalOutcome::Approved(approved) = workflow.approve(&basket_id).await.expect("approve") else {
        panic!("basket should have been pending");
    };
    assert!(live.apply(Change::Basket(approved.clone())).await);
    assert!(changes.has_changed().unwrap_or(false));

    // Replaying the same write changes nothing.
    assert!(!live.apply(Change::Basket(approved)).await);

    let rows = live.rows().await;
    assert_eq!(rows.first().and_then(|row| row.status), Some(BasketStatus::Active));
    assert!(rows.first().is_some_and(|row| !row.can_approve()));

    let basket = workflow
        .add_product(&basket_id, &ProductId::new("P1"), 2)
        .await
        .expect("add");
    live.apply(Change::Basket(basket)).await;
    assert_eq!(
        live.rows().await.first().map(|row| row.total_price.display()),
        Some("240.00".to_string())
    );
}

#[tokio::test]
async fn test_stale_basket_write_does_not_regress_board() {
    let workflow = BasketWorkflow::new(MemoryBasketStore::new());
    let live = LiveBoard::new();

    let registration = workflow.register("Bo", "5550102").await.expect("register");
    let pending = registration.basket.clone();
    live.apply(Change::User(registration.user)).await;

    let ApprovalOutcome::Approved(active) = workflow.approve(&pending.id).await.expect("approve") else {
        panic!("basket should have been pending");
    };
    live.apply(Change::Basket(active)).await;

    // The registration-time copy arrives late.
    assert!(!live.apply(Change::Basket(pending)).await);
    assert_eq!(
        live.rows().await.first().and_then(|row| row.status),
        Some(BasketStatus::Active)
    );
}

#[tokio::test]
async fn test_completed_baskets_leave_board_and_customers_see_only_their_own() {
    let store = MemoryBasketStore::new();
    let workflow = BasketWorkflow::new(store);
    let live = LiveBoard::new();

    let first = workflow.register("Asha", "5550101").await.expect("register");
    let second = workflow.register("Bo", "5550102").await.expect("register");
    for registration in [&first, &second] {
        live.apply(Change::User(registration.user.clone())).await;
        live.apply(Change::Basket(registration.basket.clone())).await;
    }

    let customer = SessionContext::customer(
        second.user.id.clone(),
        second.basket.id.clone(),
        "Bo",
    );
    let rows = live.rows().await;
    assert_eq!(visible_rows(&rows, &SessionContext::admin("Admin")).len(), 2);
    let own = visible_rows(&rows, &customer);
    assert_eq!(own.len(), 1);
    assert_eq!(own.first().map(|row| row.name.as_str()), Some("Bo"));

    workflow
        .set_status(&first.basket.id, BasketStatus::Active, false)
        .await
        .expect("activate");
    let completed = workflow
        .set_status(&first.basket.id, BasketStatus::Completed, false)
        .await
        .expect("complete");
    live.apply(Change::Basket(completed)).await;

    let names: Vec<String> = live.rows().await.into_iter().map(|row| row.name).collect();
    assert_eq!(names, ["Bo".to_string()]);
}
