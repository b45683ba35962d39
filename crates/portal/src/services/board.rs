//! Cashier board: a keyed join of users, baskets and basket items.
//!
//! Change notifications can arrive late, twice or out of order. Each
//! document is kept with the revision it was read at and a change only
//! replaces it when its revision is newer, so applying the same change again
//! or applying an older one is a no-op.

use std::collections::HashMap;

use serde::Serialize;

use shopfloor_core::{BasketId, BasketStatus, PaymentService, Price, UserId};

use crate::db::BasketItems;
use crate::models::{Basket, BasketItem, User, basket::items_total};

/// One document change fed into the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    User(User),
    Basket(Basket),
    Items(BasketItems),
}

impl Change {
    #[must_use]
    pub const fn revision(&self) -> i64 {
        match self {
            Self::User(user) => user.revision,
            Self::Basket(basket) => basket.revision,
            Self::Items(items) => items.revision,
        }
    }
}

/// A full read of the three collections.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub users: Vec<User>,
    pub baskets: Vec<Basket>,
    pub items: Vec<BasketItems>,
}

/// One row of the cashier listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardRow {
    pub user_id: UserId,
    pub name: String,
    pub phone: String,
    pub basket_id: BasketId,
    /// `None` until the user's basket has been seen.
    pub status: Option<BasketStatus>,
    pub payment_service: PaymentService,
    pub total_price: Price,
    pub item_count: u32,
    pub items: Vec<BasketItem>,
}

impl BoardRow {
    /// Whether the approve action applies to this row.
    #[must_use]
    pub fn can_approve(&self) -> bool {
        self.status.and_then(BasketStatus::approve).is_some()
    }

    /// Status text shown in the listing.
    #[must_use]
    pub fn status_label(&self) -> &'static str {
        self.status.map_or("Loading", BasketStatus::label)
    }
}

#[derive(Debug, Default)]
pub struct BasketBoard {
    users: HashMap<UserId, User>,
    baskets: HashMap<BasketId, Basket>,
    items: HashMap<BasketId, BasketItems>,
}

impl BasketBoard {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from a full read.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let mut board = Self::new();
        board.resync(snapshot);
        board
    }

    /// Replace the board contents with a full read.
    ///
    /// Used after the change feed reconnects, when notifications may have
    /// been missed.
    pub fn resync(&mut self, snapshot: Snapshot) {
        self.users = snapshot
            .users
            .into_iter()
            .map(|user| (user.id.clone(), user))
            .collect();
        self.baskets = snapshot
            .baskets
            .into_iter()
            .map(|basket| (basket.id.clone(), basket))
            .collect();
        self.items = snapshot
            .items
            .into_iter()
            .map(|items| (items.basket_id.clone(), items))
            .collect();
    }

    /// Apply one change. Returns whether the board changed.
    pub fn apply(&mut self, change: Change) -> bool {
        match change {
            Change::User(user) => upsert_newer(&mut self.users, user.id.clone(), user, |u| u.revision),
            Change::Basket(basket) => {
                upsert_newer(&mut self.baskets, basket.id.clone(), basket, |b| b.revision)
            }
            Change::Items(items) => {
                upsert_newer(&mut self.items, items.basket_id.clone(), items, |i| i.revision)
            }
        }
    }

    #[must_use]
    pub fn basket(&self, id: &BasketId) -> Option<&Basket> {
        self.baskets.get(id)
    }

    /// The joined listing, oldest registration first.
    ///
    /// Users whose basket is `Completed` are left out.
    #[must_use]
    pub fn rows(&self) -> Vec<BoardRow> {
        let mut users: Vec<&User> = self.users.values().collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

        users
            .into_iter()
            .filter_map(|user| {
                let basket = self.baskets.get(&user.basket_id);
                if basket.is_some_and(|b| !b.status.is_listed()) {
                    return None;
                }
                let items = self
                    .items
                    .get(&user.basket_id)
                    .map(|entry| entry.items.clone())
                    .unwrap_or_default();
                let total_price = basket.map_or_else(|| items_total(&items), |b| b.total_price);

                Some(BoardRow {
                    user_id: user.id.clone(),
                    name: user.name.clone(),
                    phone: user.phone.clone(),
                    basket_id: user.basket_id.clone(),
                    status: basket.map(|b| b.status),
                    payment_service: basket.map(|b| b.payment_service).unwrap_or_default(),
                    total_price,
                    item_count: items.iter().map(|item| item.quantity).sum(),
                    items,
                })
            })
            .collect()
    }
}

fn upsert_newer<K, V>(map: &mut HashMap<K, V>, key: K, value: V, revision: impl Fn(&V) -> i64) -> bool
where
    K: std::hash::Hash + Eq,
    V: PartialEq,
{
    match map.get(&key) {
        Some(current) if revision(current) > revision(&value) => false,
        Some(current) if revision(current) == revision(&value) && *current == value => false,
        _ => {
            map.insert(key, value);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use shopfloor_core::ProductId;

    use super::*;

    fn user(id: &str, basket: &str, revision: i64, secs: i64) -> User {
        User {
            id: UserId::new(id),
            name: format!("name-{id}"),
            phone: "555".to_string(),
            basket_id: BasketId::new(basket),
            revision,
            created_at: Utc.timestamp_opt(secs, 0).single().unwrap_or_default(),
        }
    }

    fn basket(id: &str, status: BasketStatus, revision: i64) -> Basket {
        Basket {
            id: BasketId::new(id),
            status,
            payment_service: PaymentService::None,
            total_price: Price::ZERO,
            revision,
            updated_at: Utc.timestamp_opt(0, 0).single().unwrap_or_default(),
        }
    }

    #[test]
    fn test_join_on_basket_id() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_1", "basket_a", 1, 10)));
        board.apply(Change::Basket(basket("basket_a", BasketStatus::Active, 2)));

        let rows = board.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, Some(BasketStatus::Active));
        assert!(!rows[0].can_approve());
    }

    #[test]
    fn test_user_before_basket_shows_loading() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_1", "basket_a", 1, 10)));
        let rows = board.rows();
        assert_eq!(rows[0].status, None);
        assert_eq!(rows[0].status_label(), "Loading");
        assert_eq!(rows[0].total_price.display(), "0.00");
    }

    #[test]
    fn test_older_revision_is_ignored() {
        let mut board = BasketBoard::new();
        assert!(board.apply(Change::Basket(basket("basket_a", BasketStatus::Active, 5))));
        assert!(!board.apply(Change::Basket(basket(
            "basket_a",
            BasketStatus::PendingCashierApproval,
            3
        ))));
        assert_eq!(
            board.basket(&BasketId::new("basket_a")).map(|b| b.status),
            Some(BasketStatus::Active)
        );
    }

    #[test]
    fn test_duplicate_delivery_reports_no_change() {
        let mut board = BasketBoard::new();
        let change = Change::Basket(basket("basket_a", BasketStatus::Active, 5));
        assert!(board.apply(change.clone()));
        assert!(!board.apply(change));
    }

    #[test]
    fn test_completed_baskets_are_hidden() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_1", "basket_a", 1, 10)));
        board.apply(Change::User(user("user_2", "basket_b", 2, 20)));
        board.apply(Change::Basket(basket("basket_a", BasketStatus::Completed, 3)));
        board.apply(Change::Basket(basket("basket_b", BasketStatus::Inactive, 4)));

        let rows = board.rows();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].basket_id, BasketId::new("basket_b"));
    }

    #[test]
    fn test_items_are_attached_and_counted() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_1", "basket_a", 1, 10)));
        board.apply(Change::Items(BasketItems {
            basket_id: BasketId::new("basket_a"),
            revision: 7,
            items: vec![BasketItem {
                product_id: ProductId::new("1001"),
                product_name: "Tea".to_string(),
                quantity: 3,
                price: Price::from_paise(4_000),
            }],
        }));

        let rows = board.rows();
        assert_eq!(rows[0].item_count, 3);
        assert_eq!(rows[0].total_price.display(), "120.00");
    }

    #[test]
    fn test_rows_follow_registration_order() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_b", "basket_b", 2, 20)));
        board.apply(Change::User(user("user_a", "basket_a", 1, 10)));
        let ids: Vec<_> = board.rows().into_iter().map(|r| r.user_id).collect();
        assert_eq!(ids, vec![UserId::new("user_a"), UserId::new("user_b")]);
    }

    #[test]
    fn test_resync_replaces_contents() {
        let mut board = BasketBoard::new();
        board.apply(Change::User(user("user_1", "basket_a", 1, 10)));
        board.resync(Snapshot {
            users: vec![user("user_2", "basket_b", 4, 20)],
            baskets: vec![basket("basket_b", BasketStatus::PendingCashierApproval, 5)],
            items: Vec::new(),
        });
        let rows = board.rows();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].can_approve());
    }
}
