//! Catalog upload.
//!
//! Catalog sheets carry `Category`, `Description`, `ImageUrl`, `Price`,
//! `ProductID`, `ProductName` and `Quantity`. Every row is checked before
//! anything is written; a sheet with a bad row is rejected whole. Accepted
//! rows are then stored one at a time, each with its image fetched and
//! embedded as a `data:` URL. The first image that cannot be fetched stops
//! the upload and the products already stored stay stored.

use std::future::Future;
use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use rust_decimal::Decimal;

use shopfloor_core::{Price, ProductId};

use crate::db::{ProductRepository, RepositoryError};
use crate::models::Product;
use crate::services::spreadsheet::SheetRow;

/// Columns a catalog sheet must fill on every row, in report order.
pub const CATALOG_COLUMNS: [&str; 7] = [
    "Category",
    "Description",
    "ImageUrl",
    "Price",
    "ProductID",
    "ProductName",
    "Quantity",
];

/// Rows shown in the upload preview.
pub const PREVIEW_ROWS: usize = 5;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// `products.price` is `NUMERIC(12, 2)`.
const PRICE_MAX_SCALE: u32 = 2;
// 10^10, the first value with more than ten integer digits.
const PRICE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

/// Why a catalog row cannot be stored.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogRowError {
    #[error("Row {row}: Missing required fields ({})", .fields.join(", "))]
    MissingFields {
        row: usize,
        fields: Vec<&'static str>,
    },
    #[error("Row {row}: Price must be a number ({value})")]
    InvalidPrice { row: usize, value: String },
    #[error("Row {row}: Price must be between 0 and 9999999999.99 with at most 2 decimals ({value})")]
    PriceOutOfRange { row: usize, value: String },
    #[error("Row {row}: Quantity must be a whole number ({value})")]
    InvalidQuantity { row: usize, value: String },
}

/// Errors raised while fetching a product image.
#[derive(Debug, Error)]
pub enum ImageFetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("image host answered {0}")]
    Status(u16),
    #[error("image was empty")]
    Empty,
}

/// Errors that end a catalog upload.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Rows failed presence or number checks; nothing was written.
    #[error("{} row(s) rejected, nothing was uploaded", .0.len())]
    Rejected(Vec<CatalogRowError>),

    #[error("the sheet has no product rows")]
    NoRows,

    /// An image could not be fetched; earlier products remain stored.
    #[error("Failed to convert image for product {product_id} after storing {stored} product(s): {reason}")]
    ImageFetch {
        product_id: String,
        stored: usize,
        reason: String,
    },

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A validated catalog row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogRow {
    pub row: usize,
    pub product_id: ProductId,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub image_url: String,
    pub price: Price,
    pub quantity: i32,
}

impl CatalogRow {
    fn into_product(self, image_data_url: String) -> Product {
        Product {
            product_id: self.product_id,
            product_name: self.product_name,
            category: self.category,
            description: self.description,
            image_url: image_data_url,
            price: self.price,
            quantity: self.quantity,
        }
    }
}

/// What an upload stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub stored: Vec<ProductId>,
    pub total: usize,
}

/// Turns an image URL into a `data:` URL.
pub trait ImageFetcher: Send + Sync {
    fn fetch_data_url(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<String, ImageFetchError>> + Send;
}

/// Writes catalog products.
pub trait ProductSink: Send + Sync {
    fn upsert(&self, product: &Product) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// [`ImageFetcher`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpImageFetcher {
    #[must_use]
    pub const fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

impl ImageFetcher for HttpImageFetcher {
    async fn fetch_data_url(&self, url: &str) -> Result<String, ImageFetchError> {
        let response = self.client.get(url).timeout(self.timeout).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ImageFetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or(FALLBACK_CONTENT_TYPE)
            .to_string();
        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(ImageFetchError::Empty);
        }

        Ok(encode_data_url(&content_type, &body))
    }
}

/// [`ProductSink`] writing to the portal database.
#[derive(Debug, Clone)]
pub struct PgProductSink {
    pool: PgPool,
}

impl PgProductSink {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl ProductSink for PgProductSink {
    async fn upsert(&self, product: &Product) -> Result<(), RepositoryError> {
        ProductRepository::new(&self.pool).upsert(product).await
    }
}

/// `data:<content type>;base64,<payload>`.
#[must_use]
pub fn encode_data_url(content_type: &str, bytes: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(bytes))
}

/// Check every row. Any failure rejects the whole sheet.
///
/// # Errors
///
/// Returns every row error found, in row order.
pub fn parse_catalog(rows: &[SheetRow]) -> Result<Vec<CatalogRow>, Vec<CatalogRowError>> {
    let mut parsed = Vec::with_capacity(rows.len());
    let mut errors = Vec::new();

    for row in rows {
        match parse_row(row) {
            Ok(catalog_row) => parsed.push(catalog_row),
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

fn parse_row(row: &SheetRow) -> Result<CatalogRow, CatalogRowError> {
    let missing: Vec<&'static str> = CATALOG_COLUMNS
        .into_iter()
        .filter(|column| row.field(column).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(CatalogRowError::MissingFields {
            row: row.number,
            fields: missing,
        });
    }

    let raw_price = row.text("Price");
    let price = raw_price
        .parse::<Price>()
        .map_err(|_| CatalogRowError::InvalidPrice {
            row: row.number,
            value: raw_price.to_string(),
        })?;
    if !price_fits_column(price) {
        return Err(CatalogRowError::PriceOutOfRange {
            row: row.number,
            value: raw_price.to_string(),
        });
    }

    let raw_quantity = row.text("Quantity");
    let quantity = raw_quantity
        .parse::<i32>()
        .map_err(|_| CatalogRowError::InvalidQuantity {
            row: row.number,
            value: raw_quantity.to_string(),
        })?;

    Ok(CatalogRow {
        row: row.number,
        product_id: ProductId::new(row.text("ProductID")),
        product_name: row.text("ProductName").to_string(),
        category: row.text("Category").to_string(),
        description: row.text("Description").to_string(),
        image_url: row.text("ImageUrl").to_string(),
        price,
        quantity,
    })
}

/// Whether `price` can be stored without the database rejecting or rounding it.
fn price_fits_column(price: Price) -> bool {
    let amount = price.amount();
    !amount.is_sign_negative()
        && amount.normalize().scale() <= PRICE_MAX_SCALE
        && amount < PRICE_LIMIT
}

/// Validate and store a catalog sheet.
///
/// # Errors
///
/// Returns `UploadError::Rejected` before any write if a row is invalid,
/// `UploadError::ImageFetch` naming the product whose image failed, or
/// `UploadError::Repository` if a write fails.
#[instrument(skip_all, fields(rows = rows.len()))]
pub async fn upload_catalog<F, S>(
    rows: &[SheetRow],
    fetcher: &F,
    sink: &S,
) -> Result<UploadReport, UploadError>
where
    F: ImageFetcher,
    S: ProductSink,
{
    let catalog = parse_catalog(rows).map_err(UploadError::Rejected)?;
    if catalog.is_empty() {
        return Err(UploadError::NoRows);
    }

    let mut report = UploadReport {
        stored: Vec::with_capacity(catalog.len()),
        total: catalog.len(),
    };

    for row in catalog {
        let data_url = match fetcher.fetch_data_url(&row.image_url).await {
            Ok(data_url) => data_url,
            Err(err) => {
                tracing::warn!(
                    product_id = %row.product_id,
                    row = row.row,
                    error = %err,
                    "Image fetch failed, stopping upload"
                );
                return Err(UploadError::ImageFetch {
                    product_id: row.product_id.into_inner(),
                    stored: report.stored.len(),
                    reason: err.to_string(),
                });
            }
        };

        let product = row.into_product(data_url);
        sink.upsert(&product).await?;
        tracing::debug!(product_id = %product.product_id, "Product stored");
        report.stored.push(product.product_id);
    }

    tracing::info!(stored = report.stored.len(), "Catalog upload finished");
    Ok(report)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn catalog_row(number: usize, product_id: &str, price: &str, quantity: &str) -> SheetRow {
        SheetRow::new(
            number,
            [
                ("Category", "Drinks"),
                ("Description", "Loose leaf"),
                ("ImageUrl", "https://img.example/tea.png"),
                ("Price", price),
                ("ProductID", product_id),
                ("ProductName", "Tea"),
                ("Quantity", quantity),
            ],
        )
    }

    #[test]
    fn test_parse_valid_row() {
        let rows = parse_catalog(&[catalog_row(1, "P1", "120.50", "4")]).unwrap();
        assert_eq!(rows[0].product_id, ProductId::new("P1"));
        assert_eq!(rows[0].price.display(), "120.50");
        assert_eq!(rows[0].quantity, 4);
    }

    #[test]
    fn test_missing_columns_are_listed() {
        let row = SheetRow::new(3, [("ProductID", "P9"), ("ProductName", "Tea")]);
        let errors = parse_catalog(&[row]).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "Row 3: Missing required fields (Category, Description, ImageUrl, Price, Quantity)"
        );
    }

    #[test]
    fn test_bad_numbers_reject_the_sheet() {
        let errors = parse_catalog(&[
            catalog_row(1, "P1", "12", "1"),
            catalog_row(2, "P2", "twelve", "1"),
            catalog_row(3, "P3", "12", "1.5"),
        ])
        .unwrap_err();
        assert_eq!(
            errors,
            vec![
                CatalogRowError::InvalidPrice {
                    row: 2,
                    value: "twelve".to_string()
                },
                CatalogRowError::InvalidQuantity {
                    row: 3,
                    value: "1.5".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let errors = parse_catalog(&[catalog_row(4, "P4", "-5", "1")]).unwrap_err();
        assert_eq!(
            errors,
            vec![CatalogRowError::PriceOutOfRange {
                row: 4,
                value: "-5".to_string()
            }]
        );
    }

    #[test]
    fn test_price_too_large_for_column_is_rejected() {
        let errors = parse_catalog(&[
            catalog_row(1, "P1", "100000000000", "1"),
            catalog_row(2, "P2", "10000000000", "1"),
        ])
        .unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .all(|err| matches!(err, CatalogRowError::PriceOutOfRange { .. }))
        );

        let rows = parse_catalog(&[catalog_row(3, "P3", "9999999999.99", "1")]).unwrap();
        assert_eq!(rows[0].price.display(), "9999999999.99");
    }

    #[test]
    fn test_price_with_more_than_two_decimals_is_rejected() {
        let errors = parse_catalog(&[catalog_row(2, "P2", "12.345", "1")]).unwrap_err();
        assert_eq!(
            errors[0].to_string(),
            "Row 2: Price must be between 0 and 9999999999.99 with at most 2 decimals (12.345)"
        );

        // Trailing zeros do not count as extra precision.
        let rows = parse_catalog(&[catalog_row(3, "P3", "12.500", "1")]).unwrap();
        assert_eq!(rows[0].price.display(), "12.50");
    }

    #[test]
    fn test_data_url_encoding() {
        assert_eq!(encode_data_url("image/png", b"abc"), "data:image/png;base64,YWJj");
    }
}
