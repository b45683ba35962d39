//! Live change feed for the cashier board.
//!
//! Database triggers publish a small JSON notice on
//! [`CHANGE_CHANNEL`](crate::db::CHANGE_CHANNEL) for every user, basket and
//! basket item write. The feed re-reads the named document and folds it into
//! the shared [`BasketBoard`]. After the listener connection drops, the board
//! is rebuilt from a full read since notices may have been lost.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use sqlx::PgPool;
use sqlx::postgres::PgListener;
use tokio::sync::{RwLock, watch};
use tokio::task::JoinHandle;

use shopfloor_core::{BasketId, UserId};

use crate::db::{BasketRepository, CHANGE_CHANNEL, RepositoryError, UserRepository};
use crate::services::board::{BasketBoard, BoardRow, Change, Snapshot};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// Table named by a change notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangedTable {
    Users,
    Baskets,
    BasketProducts,
}

/// Payload published by the change triggers.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChangeNotice {
    pub table: ChangedTable,
    /// User id, or basket id for `baskets` and `basket_products`.
    pub id: String,
    pub revision: i64,
}

impl ChangeNotice {
    /// Parse a notification payload.
    ///
    /// # Errors
    ///
    /// Returns the JSON error for a malformed payload.
    pub fn parse(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}

/// The board shared between the change feed and request handlers.
#[derive(Debug)]
pub struct LiveBoard {
    board: RwLock<BasketBoard>,
    version: watch::Sender<u64>,
}

impl LiveBoard {
    #[must_use]
    pub fn new() -> Arc<Self> {
        let (version, _) = watch::channel(0);
        Arc::new(Self {
            board: RwLock::new(BasketBoard::new()),
            version,
        })
    }

    /// Current joined listing.
    pub async fn rows(&self) -> Vec<BoardRow> {
        self.board.read().await.rows()
    }

    /// Fold one change in, waking subscribers if anything moved.
    pub async fn apply(&self, change: Change) -> bool {
        let changed = self.board.write().await.apply(change);
        if changed {
            self.bump();
        }
        changed
    }

    /// Replace the board from a full read.
    pub async fn resync(&self, snapshot: Snapshot) {
        self.board.write().await.resync(snapshot);
        self.bump();
    }

    /// Receiver that ticks whenever the listing may have changed.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

/// Read users, baskets and basket items in full.
///
/// # Errors
///
/// Returns `RepositoryError` if any read fails.
pub async fn load_snapshot(pool: &PgPool) -> Result<Snapshot, RepositoryError> {
    let users = UserRepository::new(pool).list_all().await?;
    let baskets = BasketRepository::new(pool);
    Ok(Snapshot {
        users,
        baskets: baskets.list_all().await?,
        items: baskets.all_items().await?,
    })
}

/// Re-read the document a notice points at.
///
/// Returns `None` when the document is gone.
///
/// # Errors
///
/// Returns `RepositoryError` if the read fails.
pub async fn fetch_change(
    pool: &PgPool,
    notice: &ChangeNotice,
) -> Result<Option<Change>, RepositoryError> {
    match notice.table {
        ChangedTable::Users => Ok(UserRepository::new(pool)
            .get(&UserId::new(notice.id.as_str()))
            .await?
            .map(Change::User)),
        ChangedTable::Baskets => Ok(BasketRepository::new(pool)
            .get(&BasketId::new(notice.id.as_str()))
            .await?
            .map(Change::Basket)),
        ChangedTable::BasketProducts => {
            let items = BasketRepository::new(pool)
                .items(&BasketId::new(notice.id.as_str()))
                .await?;
            Ok(Some(Change::Items(items)))
        }
    }
}

/// Run the change feed until the process exits.
pub fn spawn_change_feed(pool: PgPool, live: Arc<LiveBoard>) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            if let Err(err) = run_feed(&pool, &live).await {
                tracing::warn!(error = %err, "Change feed interrupted, reconnecting");
            }
            tokio::time::sleep(RECONNECT_DELAY).await;
        }
    })
}

async fn run_feed(pool: &PgPool, live: &LiveBoard) -> Result<(), RepositoryError> {
    let mut listener = PgListener::connect_with(pool).await?;
    listener.listen(CHANGE_CHANNEL).await?;
    tracing::info!(channel = CHANGE_CHANNEL, "Listening for basket changes");

    live.resync(load_snapshot(pool).await?).await;

    loop {
        // `None` means the connection dropped and was re-established.
        let Some(notification) = listener.try_recv().await? else {
            tracing::warn!("Change listener reconnected, resynchronising board");
            live.resync(load_snapshot(pool).await?).await;
            continue;
        };

        let notice = match ChangeNotice::parse(notification.payload()) {
            Ok(notice) => notice,
            Err(err) => {
                tracing::warn!(error = %err, payload = notification.payload(), "Ignoring malformed change notice");
                continue;
            }
        };

        tracing::debug!(?notice, "Change notice received");
        if let Some(change) = fetch_change(pool, &notice).await? {
            live.apply(change).await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use shopfloor_core::{BasketStatus, PaymentService, Price};

    use super::*;
    use crate::models::Basket;

    #[test]
    fn test_notice_parsing() {
        let notice =
            ChangeNotice::parse(r#"{"table":"basket_products","id":"basket_abc","revision":42}"#)
                .unwrap();
        assert_eq!(notice.table, ChangedTable::BasketProducts);
        assert_eq!(notice.id, "basket_abc");
        assert_eq!(notice.revision, 42);

        assert!(ChangeNotice::parse(r#"{"table":"orders","id":"x","revision":1}"#).is_err());
    }

    #[tokio::test]
    async fn test_subscribers_tick_only_on_change() {
        let live = LiveBoard::new();
        let mut rx = live.subscribe();
        let basket = Basket {
            id: BasketId::new("basket_a"),
            status: BasketStatus::Active,
            payment_service: PaymentService::None,
            total_price: Price::ZERO,
            revision: 3,
            updated_at: Utc::now(),
        };

        assert!(live.apply(Change::Basket(basket.clone())).await);
        assert!(rx.has_changed().unwrap());
        let _ = rx.borrow_and_update();

        assert!(!live.apply(Change::Basket(basket)).await);
        assert!(!rx.has_changed().unwrap());
    }
}
