//! Catalog products.

use serde::{Deserialize, Serialize};

use shopfloor_core::{Price, ProductId};

/// A catalog product, upserted by `product_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    /// The product image embedded as a `data:` URL.
    pub image_url: String,
    pub price: Price,
    pub quantity: i32,
}
