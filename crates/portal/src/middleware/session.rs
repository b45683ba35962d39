//! Session middleware configuration.
//!
//! `PostgreSQL`-backed sessions using tower-sessions, stored in
//! `portal.session`.

use sqlx::PgPool;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::PortalConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopfloor_session";

/// Session expiry after inactivity, in seconds (12 hours, one shop day).
const SESSION_EXPIRY_SECONDS: i64 = 12 * 60 * 60;

/// Schema and table created by the session migration.
const SESSION_SCHEMA: &str = "portal";
const SESSION_TABLE: &str = "session";

/// Create the `PostgreSQL` session store.
///
/// The table itself is created by `PostgresStore::migrate`, which the
/// `migrate` CLI command runs.
///
/// # Errors
///
/// Returns the store's message if the schema or table name is rejected.
pub fn create_session_store(pool: &PgPool) -> Result<PostgresStore, String> {
    PostgresStore::new(pool.clone())
        .with_schema_name(SESSION_SCHEMA)?
        .with_table_name(SESSION_TABLE)
}

/// Create the session layer over `store`.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &PortalConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(config.is_secure())
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}
