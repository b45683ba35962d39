//! Users, baskets and basket line items.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shopfloor_core::{BasketId, BasketStatus, PaymentService, Price, ProductId, UserId};

/// A registered customer. Never deleted; `basket_id` is fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub phone: String,
    pub basket_id: BasketId,
    pub revision: i64,
    pub created_at: DateTime<Utc>,
}

/// A customer's basket header. Line items are loaded separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Basket {
    pub id: BasketId,
    pub status: BasketStatus,
    pub payment_service: PaymentService,
    /// Sum of `price * quantity` over the basket's items.
    pub total_price: Price,
    pub revision: i64,
    pub updated_at: DateTime<Utc>,
}

/// One product line in a basket, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BasketItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    /// Unit price at the time the product was added.
    pub price: Price,
}

impl BasketItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Sum of line totals.
#[must_use]
pub fn items_total(items: &[BasketItem]) -> Price {
    items.iter().map(BasketItem::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, quantity: u32, paise: i64) -> BasketItem {
        BasketItem {
            product_id: ProductId::new(id),
            product_name: id.to_string(),
            quantity,
            price: Price::from_paise(paise),
        }
    }

    #[test]
    fn test_items_total() {
        assert_eq!(items_total(&[]).display(), "0.00");
        let items = [item("1001", 2, 12_000), item("1002", 1, 4_550)];
        assert_eq!(items_total(&items).display(), "285.50");
    }
}
