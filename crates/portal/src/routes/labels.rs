//! Label printing: upload a sheet of codes, get a printable A4 page.

use askama::Template;
use axum::{
    Router,
    extract::{Multipart, State},
    response::Html,
    routing::get,
};
use tracing::instrument;

use shopfloor_core::{Arrangement, BarcodeFormat, LabelStyle, PaperType, SymbolKind};

use super::{NavView, UploadForm, render, upload_limit};
use crate::{
    error::AppError,
    filters,
    middleware::RequireAdmin,
    services::{
        LabelGrid, PrintOptions, labels::build_batch, layout::SHEET_STOCKS, layout_labels,
        spreadsheet,
    },
    state::AppState,
};

/// A style entry in the print form.
#[derive(Debug, Clone)]
pub struct StyleOption {
    pub id: u8,
    pub name: &'static str,
    pub columns: usize,
}

/// A sheet stock entry in the print form.
#[derive(Debug, Clone)]
pub struct StockOption {
    pub name: &'static str,
    pub selected: bool,
}

#[derive(Template)]
#[template(path = "labels/print_form.html")]
pub struct PrintFormTemplate {
    pub nav: NavView,
    pub styles: Vec<StyleOption>,
    pub sheet_stocks: Vec<StockOption>,
    pub selected: PrintOptions,
    pub error: Option<String>,
}

/// The printable sheet. Rendered standalone so nothing but labels prints.
#[derive(Template)]
#[template(path = "labels/sheet.html")]
pub struct SheetTemplate {
    pub grid: LabelGrid,
    pub style_name: &'static str,
    pub is_qr: bool,
    pub horizontal: bool,
    pub symbol_size_px: u32,
    pub text_align: &'static str,
    pub padding_mm: u32,
    pub shows_code_caption: bool,
    pub thermal: bool,
    pub barcode_format: &'static str,
    pub sheet_stock: String,
    pub errors: Vec<String>,
}

impl SheetTemplate {
    fn new(grid: LabelGrid, options: &PrintOptions, errors: Vec<String>) -> Self {
        let style = &options.style;
        Self {
            grid,
            style_name: style.name,
            is_qr: style.symbol == SymbolKind::Qr,
            horizontal: style.arrangement == Arrangement::Horizontal,
            symbol_size_px: style.symbol_size_px,
            text_align: style.text_align.css(),
            padding_mm: style.padding_mm(),
            shows_code_caption: style.shows_code_caption,
            thermal: options.paper == PaperType::Thermal,
            barcode_format: options.barcode.label(),
            sheet_stock: options.sheet_stock.clone(),
            errors,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/print", get(print_form).post(print_sheet))
        .layer(upload_limit())
}

/// Read print choices from the form, falling back to defaults for anything
/// missing or unknown.
#[must_use]
pub(crate) fn parse_options(form: &UploadForm) -> PrintOptions {
    let defaults = PrintOptions::default();

    let style = form
        .field("style")
        .and_then(|id| id.trim().parse::<u8>().ok())
        .and_then(LabelStyle::by_id)
        .unwrap_or(defaults.style);

    let paper = match form.field("paper").map(str::trim) {
        Some("thermal") => PaperType::Thermal,
        _ => PaperType::LabelSheet,
    };

    let barcode = match form.field("barcode").map(str::trim) {
        Some("ean13") => BarcodeFormat::Ean13,
        _ => BarcodeFormat::Code128,
    };

    let sheet_stock = form
        .field("sheet_stock")
        .map(str::trim)
        .filter(|stock| SHEET_STOCKS.iter().any(|known| known == stock))
        .map_or(defaults.sheet_stock, ToString::to_string);

    PrintOptions {
        style,
        paper,
        barcode,
        sheet_stock,
    }
}

fn form_page(nav: NavView, selected: PrintOptions, error: Option<String>) -> PrintFormTemplate {
    PrintFormTemplate {
        nav,
        styles: LabelStyle::PRESETS
            .iter()
            .map(|style| StyleOption {
                id: style.id,
                name: style.name,
                columns: style.columns,
            })
            .collect(),
        sheet_stocks: SHEET_STOCKS
            .iter()
            .map(|&name| StockOption {
                name,
                selected: name == selected.sheet_stock,
            })
            .collect(),
        selected,
        error,
    }
}

/// GET /print
async fn print_form(RequireAdmin(admin): RequireAdmin) -> Html<String> {
    render(&form_page(
        NavView::new(&admin, "/print"),
        PrintOptions::default(),
        None,
    ))
}

/// POST /print
#[instrument(skip_all)]
async fn print_sheet(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Html<String>, AppError> {
    let form = UploadForm::read(multipart).await?;
    let options = parse_options(&form);

    let rows = match spreadsheet::read_rows(form.file.as_deref().unwrap_or_default()) {
        Ok(rows) => rows,
        Err(err) => {
            return Ok(render(&form_page(
                NavView::new(&admin, "/print"),
                options,
                Some(format!("Error reading file: {err}")),
            )));
        }
    };

    let batch = build_batch(&rows, &state.config().print.label_lookup_url);
    tracing::info!(
        labels = batch.labels.len(),
        rejected = batch.errors.len(),
        style = options.style.name,
        "Label sheet built"
    );

    let grid = layout_labels(&batch.labels, &options.style);
    Ok(render(&SheetTemplate::new(grid, &options, batch.errors)))
}

#[cfg(test)]
#[allow(clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::services::layout::DEFAULT_SHEET_STOCK;

    fn form(fields: &[(&str, &str)]) -> UploadForm {
        UploadForm {
            file: None,
            fields: fields
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_parse_options_reads_choices() {
        let options = parse_options(&form(&[
            ("style", "4"),
            ("paper", "thermal"),
            ("barcode", "ean13"),
            ("sheet_stock", SHEET_STOCKS[0]),
        ]));
        assert_eq!(options.style, LabelStyle::BARCODE_TYPE_2);
        assert_eq!(options.paper, PaperType::Thermal);
        assert_eq!(options.barcode, BarcodeFormat::Ean13);
        assert_eq!(options.sheet_stock, SHEET_STOCKS[0]);
    }

    #[test]
    fn test_parse_options_falls_back_to_defaults() {
        let options = parse_options(&form(&[("style", "99"), ("sheet_stock", "Unknown")]));
        assert_eq!(options.style, LabelStyle::QR_HORIZONTAL);
        assert_eq!(options.paper, PaperType::LabelSheet);
        assert_eq!(options.barcode, BarcodeFormat::Code128);
        assert_eq!(options.sheet_stock, DEFAULT_SHEET_STOCK);
    }

    #[test]
    fn test_sheet_view_follows_style() {
        let options = PrintOptions {
            style: LabelStyle::BARCODE_TYPE_2,
            ..PrintOptions::default()
        };
        let grid = layout_labels(&[], &options.style);
        let sheet = SheetTemplate::new(grid, &options, vec!["Row 2: Code must be numeric".to_string()]);
        assert!(!sheet.is_qr);
        assert!(!sheet.horizontal);
        assert!(sheet.shows_code_caption);
        assert_eq!(sheet.padding_mm, 1);
        assert_eq!(sheet.errors.len(), 1);
    }
}
