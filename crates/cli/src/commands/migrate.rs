//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! sf-cli migrate
//! ```
//!
//! Applies `crates/portal/migrations/` and then creates the session table
//! (`portal.session`) through the session store.

use super::{CommandError, connect};

/// Run all migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running portal migrations...");
    sqlx::migrate!("../portal/migrations").run(&pool).await?;

    tracing::info!("Creating session table...");
    let store = shopfloor_portal::middleware::create_session_store(&pool)
        .map_err(CommandError::SessionStore)?;
    store.migrate().await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
