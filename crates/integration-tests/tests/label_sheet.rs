//! Label spreadsheet validation and sheet layout.

use shopfloor_core::LabelStyle;
use shopfloor_integration_tests::sheet_row;
use shopfloor_portal::services::labels::build_batch;
use shopfloor_portal::services::layout::PAGE_HEIGHT_MM;
use shopfloor_portal::services::layout_labels;
use url::Url;

fn lookup_base() -> Url {
    Url::parse("https://shop.example/product/").expect("valid url")
}

#[test]
fn test_mixed_sheet_keeps_valid_rows_and_reports_the_rest() {
    let rows = vec![
        sheet_row(1, &[("Title", "Rice"), ("Description", "Grains"), ("Code", "1001")]),
        sheet_row(2, &[("Title", "Milk"), ("Description", "Dairy"), ("Code", "1001")]),
        sheet_row(3, &[("Title", "Bread"), ("Code", "1003")]),
        sheet_row(4, &[("Title", "Eggs"), ("Description", "Farm"), ("Code", "12A")]),
        sheet_row(5, &[("Title", "Oil"), ("Description", "Kitchen"), ("Code", "1005")]),
    ];

    let batch = build_batch(&rows, &lookup_base());

    assert_eq!(
        batch.errors,
        vec![
            "Row 2: Duplicate Code (1001)".to_string(),
            "Row 3: Missing required fields".to_string(),
            "Row 4: Code must be numeric".to_string(),
        ]
    );
    let names: Vec<&str> = batch.labels.iter().map(|label| label.name.as_str()).collect();
    assert_eq!(names, ["Rice", "Oil"]);
    assert_eq!(
        batch.labels.first().map(|label| label.url.as_str()),
        Some("https://shop.example/product/1001")
    );
}

#[test]
fn test_rejected_code_can_reappear_later() {
    let rows = vec![
        sheet_row(1, &[("Title", "Rice"), ("Description", "Grains"), ("Code", "x1")]),
        sheet_row(2, &[("Title", "Rice"), ("Description", "Grains"), ("Code", "7")]),
        sheet_row(3, &[("Title", "Rice"), ("Description", "Grains"), ("Code", "7")]),
    ];

    let batch = build_batch(&rows, &lookup_base());
    assert_eq!(batch.labels.len(), 1);
    assert_eq!(batch.errors.len(), 2);
}

#[test]
fn test_sheet_fills_rows_by_style_columns() {
    let rows: Vec<_> = (1..=7)
        .map(|n| {
            let code = format!("{}", 100 + n);
            sheet_row(n, &[("Title", "Item"), ("Description", "Cat"), ("Code", code.as_str())])
        })
        .collect();
    let batch = build_batch(&rows, &lookup_base());

    let qr = layout_labels(&batch.labels, &LabelStyle::QR_HORIZONTAL);
    assert_eq!(qr.rows.len(), 4);
    assert_eq!(qr.rows.last().map(Vec::len), Some(1));
    assert_eq!(
        qr.rows.first().and_then(|row| row.first()).map(|cell| cell.payload.as_str()),
        Some("https://shop.example/product/101")
    );

    let barcode = layout_labels(&batch.labels, &LabelStyle::BARCODE_TYPE_1);
    assert_eq!(barcode.rows.len(), 3);
    assert_eq!(
        barcode.rows.first().and_then(|row| row.first()).map(|cell| cell.payload.as_str()),
        Some("101")
    );
    let height = barcode.row_height_mm.unwrap_or_default();
    assert!((height * 3.0 - PAGE_HEIGHT_MM).abs() < 1e-9);
}

#[test]
fn test_empty_sheet_lays_out_nothing() {
    let batch = build_batch(&[], &lookup_base());
    let grid = layout_labels(&batch.labels, &LabelStyle::QR_VERTICAL);
    assert!(grid.rows.is_empty());
    assert_eq!(grid.row_height_css(), "auto");
}
