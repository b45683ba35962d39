//! Integration test support for Shopfloor.
//!
//! In-memory stand-ins for the portal's persistence and image seams, so the
//! basket workflow and catalog upload can be driven end to end without a
//! database. Tests that need a running portal are marked `#[ignore]`.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfloor-integration-tests
//!
//! # Including the tests against a running portal
//! SHOPFLOOR_BASE_URL=http://localhost:3000 cargo test -p shopfloor-integration-tests -- --ignored
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::Utc;

use shopfloor_core::{BasketId, BasketStatus, PaymentService, Price, ProductId, UserId};
use shopfloor_portal::db::{ItemWrite, RepositoryError, StatusWrite};
use shopfloor_portal::models::{Basket, BasketItem, Product, User, basket::items_total};
use shopfloor_portal::services::upload::ImageFetchError;
use shopfloor_portal::services::{BasketStore, ImageFetcher, ProductSink, SheetRow};

/// Base URL of a running portal for the ignored HTTP tests.
#[must_use]
pub fn portal_base_url() -> String {
    std::env::var("SHOPFLOOR_BASE_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

/// Build a spreadsheet row from `(header, value)` pairs.
#[must_use]
pub fn sheet_row(number: usize, cells: &[(&str, &str)]) -> SheetRow {
    SheetRow::new(number, cells.iter().copied())
}

/// A catalog product with a placeholder image.
#[must_use]
pub fn product(id: &str, name: &str, paise: i64) -> Product {
    Product {
        product_id: ProductId::new(id),
        product_name: name.to_string(),
        category: "Grocery".to_string(),
        description: format!("{name} description"),
        image_url: "data:image/png;base64,AA==".to_string(),
        price: Price::from_paise(paise),
        quantity: 10,
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    baskets: HashMap<BasketId, Basket>,
    items: HashMap<BasketId, Vec<BasketItem>>,
    products: HashMap<ProductId, Product>,
    revision: i64,
    /// Registrations still to be refused as id collisions.
    pending_conflicts: usize,
}

impl MemoryState {
    fn next_revision(&mut self) -> i64 {
        self.revision += 1;
        self.revision
    }
}

/// [`BasketStore`] kept in memory.
///
/// Revisions come from one counter shared by every write, as the database
/// sequence does.
#[derive(Debug, Default)]
pub struct MemoryBasketStore {
    state: Mutex<MemoryState>,
}

impl MemoryBasketStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a catalog product baskets can refer to.
    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        self.lock().products.insert(product.product_id.clone(), product);
        self
    }

    /// Refuse the next `count` registrations with an id conflict.
    pub fn fail_registrations(&self, count: usize) {
        self.lock().pending_conflicts = count;
    }

    /// Force a basket's status, bypassing the workflow.
    pub fn force_status(&self, id: &BasketId, status: BasketStatus) {
        let mut state = self.lock();
        let revision = state.next_revision();
        if let Some(basket) = state.baskets.get_mut(id) {
            basket.status = status;
            basket.revision = revision;
        }
    }

    #[must_use]
    pub fn items(&self, id: &BasketId) -> Vec<BasketItem> {
        self.lock().items.get(id).cloned().unwrap_or_default()
    }

    #[must_use]
    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl BasketStore for MemoryBasketStore {
    async fn register(
        &self,
        user_id: &UserId,
        name: &str,
        phone: &str,
        basket_id: &BasketId,
    ) -> Result<(User, Basket), RepositoryError> {
        let mut state = self.lock();
        if state.pending_conflicts > 0 {
            state.pending_conflicts -= 1;
            return Err(RepositoryError::Conflict("id already taken".to_string()));
        }
        if state.users.contains_key(user_id) || state.baskets.contains_key(basket_id) {
            return Err(RepositoryError::Conflict("id already taken".to_string()));
        }

        let now = Utc::now();
        let basket = Basket {
            id: basket_id.clone(),
            status: BasketStatus::PendingCashierApproval,
            payment_service: PaymentService::None,
            total_price: Price::ZERO,
            revision: state.next_revision(),
            updated_at: now,
        };
        let user = User {
            id: user_id.clone(),
            name: name.to_string(),
            phone: phone.to_string(),
            basket_id: basket_id.clone(),
            revision: state.next_revision(),
            created_at: now,
        };
        state.baskets.insert(basket_id.clone(), basket.clone());
        state.users.insert(user_id.clone(), user.clone());
        Ok((user, basket))
    }

    async fn basket(&self, id: &BasketId) -> Result<Option<Basket>, RepositoryError> {
        Ok(self.lock().baskets.get(id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: &BasketId,
        expected: BasketStatus,
        next: BasketStatus,
    ) -> Result<StatusWrite, RepositoryError> {
        let mut state = self.lock();
        let revision = state.next_revision();
        let basket = state.baskets.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if basket.status != expected {
            return Ok(StatusWrite::Stale(basket.status));
        }
        basket.status = next;
        basket.revision = revision;
        basket.updated_at = Utc::now();
        Ok(StatusWrite::Applied(basket.clone()))
    }

    async fn add_item(
        &self,
        id: &BasketId,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<ItemWrite, RepositoryError> {
        let mut state = self.lock();
        let status = state
            .baskets
            .get(id)
            .map(|basket| basket.status)
            .ok_or(RepositoryError::NotFound)?;
        if !status.accepts_items() {
            return Ok(ItemWrite::Refused(status));
        }
        let Some(product) = state.products.get(product_id).cloned() else {
            return Ok(ItemWrite::UnknownProduct);
        };

        let items = state.items.entry(id.clone()).or_default();
        match items.iter_mut().find(|item| item.product_id == *product_id) {
            Some(item) => item.quantity += quantity,
            None => items.push(BasketItem {
                product_id: product.product_id,
                product_name: product.product_name,
                quantity,
                price: product.price,
            }),
        }
        let total = items_total(items);

        let revision = state.next_revision();
        let basket = state.baskets.get_mut(id).ok_or(RepositoryError::NotFound)?;
        basket.total_price = total;
        basket.revision = revision;
        Ok(ItemWrite::Added(basket.clone()))
    }
}

/// [`ImageFetcher`] answering from a fixed set of URLs.
#[derive(Debug, Default)]
pub struct StubImageFetcher {
    known: HashSet<String>,
    requested: Mutex<Vec<String>>,
}

impl StubImageFetcher {
    /// A fetcher that serves exactly `urls`; anything else answers 404.
    #[must_use]
    pub fn serving(urls: &[&str]) -> Self {
        Self {
            known: urls.iter().map(ToString::to_string).collect(),
            requested: Mutex::default(),
        }
    }

    /// URLs requested so far, in order.
    #[must_use]
    pub fn requested(&self) -> Vec<String> {
        self.requested
            .lock()
            .map(|urls| urls.clone())
            .unwrap_or_default()
    }
}

impl ImageFetcher for StubImageFetcher {
    async fn fetch_data_url(&self, url: &str) -> Result<String, ImageFetchError> {
        if let Ok(mut requested) = self.requested.lock() {
            requested.push(url.to_string());
        }
        if self.known.contains(url) {
            Ok(format!("data:image/png;base64,{}", url.len()))
        } else {
            Err(ImageFetchError::Status(404))
        }
    }
}

/// [`ProductSink`] collecting products in memory.
#[derive(Debug, Default)]
pub struct MemoryProductSink {
    stored: Mutex<Vec<Product>>,
}

impl MemoryProductSink {
    #[must_use]
    pub fn stored(&self) -> Vec<Product> {
        self.stored
            .lock()
            .map(|stored| stored.clone())
            .unwrap_or_default()
    }
}

impl ProductSink for MemoryProductSink {
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        if let Ok(mut stored) = self.stored.lock() {
            stored.retain(|existing| existing.product_id != product.product_id);
            stored.push(product.clone());
        }
        Ok(())
    }
}
