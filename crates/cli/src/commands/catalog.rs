//! Catalog import from a spreadsheet file.
//!
//! # Usage
//!
//! ```bash
//! sf-cli catalog import --file products.xlsx
//! ```
//!
//! Runs the same checks as the portal's upload page: the whole sheet is
//! rejected if any row is incomplete, and the import stops at the first image
//! that cannot be fetched.

use std::path::Path;
use std::time::Duration;

use shopfloor_portal::services::{
    HttpImageFetcher, PgProductSink, UploadError, spreadsheet, upload_catalog,
};

use super::{CommandError, connect};

const IMAGE_FETCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Import products from `file`.
pub async fn import(file: &Path) -> Result<(), CommandError> {
    let bytes = tokio::fs::read(file).await.map_err(|source| CommandError::Io {
        path: file.display().to_string(),
        source,
    })?;
    let rows = spreadsheet::read_rows(&bytes)?;
    tracing::info!("Read {} row(s) from {}", rows.len(), file.display());

    let pool = connect().await?;
    let fetcher = HttpImageFetcher::new(reqwest::Client::new(), IMAGE_FETCH_TIMEOUT);
    let sink = PgProductSink::new(pool);

    match upload_catalog(&rows, &fetcher, &sink).await {
        Ok(report) => {
            tracing::info!("Stored {} of {} product(s)", report.stored.len(), report.total);
            Ok(())
        }
        Err(UploadError::Rejected(errors)) => {
            for error in &errors {
                tracing::error!("{error}");
            }
            Err(UploadError::Rejected(errors).into())
        }
        Err(err) => Err(err.into()),
    }
}
