//! Label sheet layout.
//!
//! A pure function of the accepted labels and a [`LabelStyle`]: labels fill
//! the grid row by row in upload order and the rows share the A4 page height
//! evenly.

use serde::Serialize;

use shopfloor_core::{BarcodeFormat, LabelStyle, PaperType, SymbolKind};

use crate::services::labels::LabelRecord;

/// A4 page height in millimetres.
pub const PAGE_HEIGHT_MM: f64 = 297.0;

/// Label sheet stocks offered in the print options.
pub const SHEET_STOCKS: [&str; 4] = [
    "3M Asia Pacific 21312 (A4)",
    "3M Asia Pacific 21314 (A4)",
    "3M Asia Pacific 21315 (A4)",
    "3M Asia Pacific 21316 (A4)",
];

/// Stock selected when none is chosen.
pub const DEFAULT_SHEET_STOCK: &str = SHEET_STOCKS[1];

/// Print options chosen alongside the label style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintOptions {
    pub style: LabelStyle,
    pub paper: PaperType,
    pub barcode: BarcodeFormat,
    pub sheet_stock: String,
}

impl Default for PrintOptions {
    fn default() -> Self {
        Self {
            style: LabelStyle::default(),
            paper: PaperType::default(),
            barcode: BarcodeFormat::default(),
            sheet_stock: DEFAULT_SHEET_STOCK.to_string(),
        }
    }
}

/// One printed label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelCell {
    pub id: usize,
    pub name: String,
    pub category: String,
    pub code: String,
    /// What the symbol encodes: the lookup URL for QR codes, the code for
    /// barcodes.
    pub payload: String,
}

impl LabelCell {
    fn new(record: &LabelRecord, symbol: SymbolKind) -> Self {
        let payload = match symbol {
            SymbolKind::Qr => record.url.clone(),
            SymbolKind::Barcode => record.code.clone(),
        };
        Self {
            id: record.id,
            name: record.name.clone(),
            category: record.category.clone(),
            code: record.code.clone(),
            payload,
        }
    }
}

/// Labels arranged into grid rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelGrid {
    pub columns: usize,
    pub rows: Vec<Vec<LabelCell>>,
    /// Height of each grid row; `None` when there is nothing to print.
    pub row_height_mm: Option<f64>,
}

impl LabelGrid {
    /// Row height formatted for CSS (`grid-auto-rows`).
    #[must_use]
    pub fn row_height_css(&self) -> String {
        self.row_height_mm
            .map_or_else(|| "auto".to_string(), |mm| format!("{mm:.2}mm"))
    }

    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }
}

/// Lay the labels out for `style`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn layout_labels(labels: &[LabelRecord], style: &LabelStyle) -> LabelGrid {
    let columns = style.columns.max(1);
    let rows: Vec<Vec<LabelCell>> = labels
        .chunks(columns)
        .map(|chunk| chunk.iter().map(|r| LabelCell::new(r, style.symbol)).collect())
        .collect();

    let row_height_mm = (!rows.is_empty()).then(|| PAGE_HEIGHT_MM / rows.len() as f64);

    LabelGrid {
        columns,
        rows,
        row_height_mm,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(n: usize) -> Vec<LabelRecord> {
        (1..=n)
            .map(|i| LabelRecord {
                id: i,
                name: format!("Item {i}"),
                category: "Cat".to_string(),
                url: format!("https://example.com/product/{i}"),
                code: i.to_string(),
            })
            .collect()
    }

    #[test]
    fn test_row_count_is_ceiling() {
        for n in 0..12 {
            for style in LabelStyle::PRESETS {
                let grid = layout_labels(&records(n), &style);
                assert_eq!(grid.rows.len(), n.div_ceil(style.columns));
                assert!(grid.rows.iter().all(|row| row.len() <= style.columns));
                assert_eq!(grid.cell_count(), n);
            }
        }
    }

    #[test]
    fn test_input_order_is_preserved() {
        let grid = layout_labels(&records(7), &LabelStyle::QR_VERTICAL);
        let ids: Vec<usize> = grid.rows.iter().flatten().map(|cell| cell.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_row_height_divides_page() {
        let grid = layout_labels(&records(5), &LabelStyle::QR_HORIZONTAL);
        assert_eq!(grid.rows.len(), 3);
        assert_eq!(grid.row_height_css(), "99.00mm");

        let empty = layout_labels(&[], &LabelStyle::QR_HORIZONTAL);
        assert!(empty.rows.is_empty());
        assert_eq!(empty.row_height_mm, None);
        assert_eq!(empty.row_height_css(), "auto");
    }

    #[test]
    fn test_payload_follows_symbol() {
        let labels = records(1);
        let qr = layout_labels(&labels, &LabelStyle::QR_HORIZONTAL);
        assert_eq!(qr.rows[0][0].payload, "https://example.com/product/1");
        let bar = layout_labels(&labels, &LabelStyle::BARCODE_TYPE_2);
        assert_eq!(bar.rows[0][0].payload, "1");
    }
}
