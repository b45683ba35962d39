//! Domain models for the portal.
//!
//! Records mirror the `users`, `baskets`, `basket_products` and `products`
//! tables. Every basket-side record carries the `revision` stamped by the
//! database so live updates can be ordered.

pub mod basket;
pub mod product;
pub mod session;

pub use basket::{Basket, BasketItem, User};
pub use product::Product;
pub use session::{SessionContext, keys as session_keys};
