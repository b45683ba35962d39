//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::PortalConfig;
use crate::services::{
    BasketWorkflow, HttpImageFetcher, IdentityGate, LiveBoard, PgBasketStore, PgProductSink,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: PortalConfig,
    pool: PgPool,
    http: reqwest::Client,
    live: Arc<LiveBoard>,
}

impl AppState {
    /// Build the state.
    ///
    /// # Errors
    ///
    /// Returns `reqwest::Error` if the HTTP client cannot be built.
    pub fn new(config: PortalConfig, pool: PgPool, live: Arc<LiveBoard>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("shopfloor-portal/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                http,
                live,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &PortalConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// The cashier board kept current by the change feed.
    #[must_use]
    pub fn live(&self) -> &Arc<LiveBoard> {
        &self.inner.live
    }

    #[must_use]
    pub fn identity_gate(&self) -> IdentityGate<'_> {
        IdentityGate::new(&self.inner.config.admin)
    }

    #[must_use]
    pub fn workflow(&self) -> BasketWorkflow<PgBasketStore> {
        BasketWorkflow::new(PgBasketStore::new(self.inner.pool.clone()))
    }

    #[must_use]
    pub fn image_fetcher(&self) -> HttpImageFetcher {
        HttpImageFetcher::new(
            self.inner.http.clone(),
            self.inner.config.catalog.image_fetch_timeout,
        )
    }

    #[must_use]
    pub fn product_sink(&self) -> PgProductSink {
        PgProductSink::new(self.inner.pool.clone())
    }
}
