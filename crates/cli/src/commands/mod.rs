//! CLI subcommands.

pub mod basket;
pub mod catalog;
pub mod migrate;

use secrecy::SecretString;
use sqlx::PgPool;
use thiserror::Error;

/// Errors shared by every command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Session store error: {0}")]
    SessionStore(String),

    #[error(transparent)]
    Repository(#[from] shopfloor_portal::db::RepositoryError),

    #[error(transparent)]
    Workflow(#[from] shopfloor_portal::services::WorkflowError),

    #[error(transparent)]
    Spreadsheet(#[from] shopfloor_portal::services::SpreadsheetError),

    #[error(transparent)]
    Upload(#[from] shopfloor_portal::services::UploadError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Could not read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Connect to the database named by `SHOPFLOOR_DATABASE_URL`.
pub async fn connect() -> Result<PgPool, CommandError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("SHOPFLOOR_DATABASE_URL")
        .map_err(|_| CommandError::MissingEnvVar("SHOPFLOOR_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = shopfloor_portal::db::create_pool(&SecretString::from(database_url)).await?;
    Ok(pool)
}
