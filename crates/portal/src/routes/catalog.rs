//! Catalog spreadsheet upload.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, State},
    response::Html,
    routing::get,
};
use tracing::instrument;

use super::{NavView, UploadForm, render, upload_limit};
use crate::{
    error::AppError,
    filters,
    middleware::RequireAdmin,
    services::{
        SheetRow, UploadError, UploadReport, spreadsheet,
        upload::{CATALOG_COLUMNS, PREVIEW_ROWS},
        upload_catalog,
    },
    state::AppState,
};

#[derive(Template)]
#[template(path = "catalog/upload.html")]
pub struct UploadTemplate {
    pub nav: NavView,
    pub columns: &'static [&'static str],
    /// First rows of the sheet, in column order.
    pub preview: Vec<Vec<String>>,
    pub report: Option<UploadReport>,
    pub errors: Vec<String>,
}

impl UploadTemplate {
    fn new(nav: NavView) -> Self {
        Self {
            nav,
            columns: &CATALOG_COLUMNS,
            preview: Vec::new(),
            report: None,
            errors: Vec::new(),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", get(upload_page).post(upload))
        .layer(upload_limit())
}

/// First `PREVIEW_ROWS` rows laid out under the catalog columns.
#[must_use]
pub fn preview_rows(rows: &[SheetRow]) -> Vec<Vec<String>> {
    rows.iter()
        .take(PREVIEW_ROWS)
        .map(|row| {
            CATALOG_COLUMNS
                .iter()
                .map(|column| row.text(column).to_string())
                .collect()
        })
        .collect()
}

/// GET /upload
async fn upload_page(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&UploadTemplate::new(NavView::new(&admin, "/upload")))
}

/// POST /upload
#[instrument(skip_all)]
async fn upload(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = UploadForm::read(multipart).await?;
    let mut page = UploadTemplate::new(NavView::new(&admin, "/upload"));

    let rows = match spreadsheet::read_rows(form.file.as_deref().unwrap_or_default()) {
        Ok(rows) => rows,
        Err(err) => {
            page.errors.push(format!("Error reading file: {err}"));
            return Ok(render(&page));
        }
    };
    page.preview = preview_rows(&rows);

    match upload_catalog(&rows, &state.image_fetcher(), &state.product_sink()).await {
        Ok(report) => {
            tracing::info!(stored = report.stored.len(), "Catalog uploaded");
            page.report = Some(report);
        }
        Err(UploadError::Rejected(errors)) => {
            page.errors = errors.iter().map(ToString::to_string).collect();
        }
        Err(UploadError::Repository(err)) => return Err(AppError::Database(err)),
        Err(err) => page.errors.push(err.to_string()),
    }

    Ok(render(&page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_keeps_column_order_and_limit() {
        let rows: Vec<SheetRow> = (1..=7)
            .map(|n| {
                SheetRow::new(
                    n,
                    [
                        ("ProductID", format!("P{n}")),
                        ("Price", "10".to_string()),
                    ],
                )
            })
            .collect();

        let preview = preview_rows(&rows);
        assert_eq!(preview.len(), PREVIEW_ROWS);
        assert_eq!(preview.first().map(Vec::len), Some(CATALOG_COLUMNS.len()));
        let first = preview.first().cloned().unwrap_or_default();
        assert_eq!(first.iter().filter(|cell| !cell.is_empty()).count(), 2);
        assert!(first.contains(&"P1".to_string()));
    }
}
