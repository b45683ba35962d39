//! Receipt computation for the bill print.

use chrono::{DateTime, Datelike, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use serde::Serialize;

use shopfloor_core::{PaymentService, Price};

use crate::models::BasketItem;

/// One receipt line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillLine {
    /// 1-based serial number.
    pub serial: usize,
    pub name: String,
    pub quantity: u32,
    pub rate: Price,
    pub amount: Price,
}

/// Receipt totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BillTotals {
    pub gross: Price,
    pub discount_percent: Decimal,
    pub discount: Price,
    pub tax: Price,
    pub grand_total: Price,
    pub round_off: Price,
    pub tendered: Price,
    pub change: Price,
    pub total_quantity: u32,
}

/// A complete receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bill {
    pub number: String,
    pub issued_at: DateTime<Utc>,
    /// Payment mode printed on the receipt. Unset payment prints as cash.
    pub payment_mode: PaymentService,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub lines: Vec<BillLine>,
    pub totals: BillTotals,
}

impl Bill {
    /// Build a receipt for `items`.
    #[must_use]
    pub fn new(
        items: &[BasketItem],
        discount_percent: Decimal,
        payment: PaymentService,
        issued_at: DateTime<Utc>,
    ) -> Self {
        let sequence = rand::rng().random_range(0..1000);
        Self {
            number: bill_number(sequence, issued_at.year()),
            issued_at,
            payment_mode: match payment {
                PaymentService::None => PaymentService::Cash,
                other => other,
            },
            customer_name: None,
            customer_phone: None,
            lines: bill_lines(items),
            totals: compute_totals(items, discount_percent),
        }
    }

    #[must_use]
    pub fn with_customer(mut self, name: impl Into<String>, phone: impl Into<String>) -> Self {
        self.customer_name = Some(name.into());
        self.customer_phone = Some(phone.into());
        self
    }

    /// Amount in words line, e.g. `Rs. 541.50 Rupees only`.
    #[must_use]
    pub fn amount_in_words(&self) -> String {
        format!("Rs. {} Rupees only", self.totals.grand_total.display())
    }
}

/// `SI-<n>-BKM-<year>`.
#[must_use]
pub fn bill_number(sequence: u32, year: i32) -> String {
    format!("SI-{sequence}-BKM-{year}")
}

#[must_use]
pub fn bill_lines(items: &[BasketItem]) -> Vec<BillLine> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| BillLine {
            serial: index + 1,
            name: item.product_name.clone(),
            quantity: item.quantity,
            rate: item.price,
            amount: item.line_total(),
        })
        .collect()
}

/// Gross, discount and grand total. Tax and change are always zero and the
/// full grand total is tendered.
#[must_use]
pub fn compute_totals(items: &[BasketItem], discount_percent: Decimal) -> BillTotals {
    let gross: Price = items.iter().map(BasketItem::line_total).sum();
    let discount = gross.percent(discount_percent).rounded();
    let tax = Price::ZERO;
    let grand_total = (gross - discount + tax).rounded();

    BillTotals {
        gross,
        discount_percent,
        discount,
        tax,
        grand_total,
        round_off: Price::ZERO,
        tendered: grand_total,
        change: Price::ZERO,
        total_quantity: items.iter().map(|item| item.quantity).sum(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use shopfloor_core::ProductId;

    use super::*;

    fn item(name: &str, quantity: u32, paise: i64) -> BasketItem {
        BasketItem {
            product_id: ProductId::new(name),
            product_name: name.to_string(),
            quantity,
            price: Price::from_paise(paise),
        }
    }

    fn sample_items() -> Vec<BasketItem> {
        vec![
            item("Organic Rice (1kg)", 2, 12_000),
            item("Fresh Milk (1L)", 3, 8_550),
            item("Whole Wheat Bread", 1, 4_500),
            item("Farm Eggs (12pc)", 2, 18_000),
            item("Cooking Oil (1L)", 1, 25_000),
        ]
    }

    #[test]
    fn test_totals_with_five_percent_discount() {
        let totals = compute_totals(&sample_items(), Decimal::from(5));
        assert_eq!(totals.gross.display(), "1151.50");
        assert_eq!(totals.discount.display(), "57.58");
        assert_eq!(totals.grand_total.display(), "1093.92");
        assert_eq!(totals.tendered, totals.grand_total);
        assert_eq!(totals.change.display(), "0.00");
        assert_eq!(totals.total_quantity, 9);
    }

    #[test]
    fn test_empty_basket_bill() {
        let totals = compute_totals(&[], Decimal::from(5));
        assert_eq!(totals.grand_total.display(), "0.00");
        assert_eq!(totals.total_quantity, 0);
    }

    #[test]
    fn test_lines_are_numbered() {
        let lines = bill_lines(&sample_items());
        assert_eq!(lines[0].serial, 1);
        assert_eq!(lines[1].amount.display(), "256.50");
        assert_eq!(lines[4].serial, 5);
    }

    #[test]
    fn test_bill_number_and_payment_default() {
        assert_eq!(bill_number(42, 2025), "SI-42-BKM-2025");

        let issued = Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).single().unwrap_or_default();
        let bill = Bill::new(&sample_items(), Decimal::from(5), PaymentService::None, issued);
        assert_eq!(bill.payment_mode, PaymentService::Cash);
        assert!(bill.number.starts_with("SI-"));
        assert!(bill.number.ends_with("-BKM-2025"));
        assert_eq!(bill.amount_in_words(), "Rs. 1093.92 Rupees only");
    }
}
