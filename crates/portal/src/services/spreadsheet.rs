//! Spreadsheet reading for label and catalog uploads.
//!
//! The first worksheet is read with its first row as the header. Each later
//! non-blank row becomes a [`SheetRow`] keyed by header name, numbered from 1
//! in the order the rows appear. Empty cells are left out of the row.

use std::collections::HashMap;
use std::io::Cursor;

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use thiserror::Error;

/// Errors raised while reading an uploaded workbook.
#[derive(Debug, Error)]
pub enum SpreadsheetError {
    #[error("could not read workbook: {0}")]
    Open(#[from] calamine::Error),

    #[error("workbook has no worksheets")]
    NoWorksheet,

    #[error("the uploaded file is empty")]
    EmptyUpload,
}

/// One data row, keyed by header name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SheetRow {
    /// 1-based position among the data rows.
    pub number: usize,
    cells: HashMap<String, String>,
}

impl SheetRow {
    /// Build a row from `(header, value)` pairs.
    pub fn new<K, V>(number: usize, cells: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            number,
            cells: cells
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Trimmed cell text, or `""` when the column is absent or blank.
    #[must_use]
    pub fn text(&self, column: &str) -> &str {
        self.cells.get(column).map_or("", |value| value.trim())
    }

    /// Trimmed cell text when present and non-blank.
    #[must_use]
    pub fn field(&self, column: &str) -> Option<&str> {
        Some(self.text(column)).filter(|value| !value.is_empty())
    }
}

/// Parse an uploaded workbook (xlsx, xlsm, xls or ods).
///
/// # Errors
///
/// Returns `SpreadsheetError` if the bytes are not a readable workbook.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<SheetRow>, SpreadsheetError> {
    if bytes.is_empty() {
        return Err(SpreadsheetError::EmptyUpload);
    }

    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(SpreadsheetError::NoWorksheet)??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let header: Vec<String> = header.iter().map(|cell| cell_text(cell).trim().to_string()).collect();

    Ok(rows_from_cells(&header, rows.map(|row| row.iter().map(cell_text).collect())))
}

/// Key raw cell rows by header, dropping blank rows and numbering the rest.
pub fn rows_from_cells(
    header: &[String],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Vec<SheetRow> {
    rows.into_iter()
        .filter(|cells| cells.iter().any(|cell| !cell.trim().is_empty()))
        .enumerate()
        .map(|(index, cells)| {
            let keyed = header
                .iter()
                .zip(cells)
                .filter(|(name, value)| !name.is_empty() && !value.trim().is_empty())
                .map(|(name, value)| (name.clone(), value));
            SheetRow::new(index + 1, keyed)
        })
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::String(s) | Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        // Whole numbers read back the way they were typed.
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        Data::DateTime(d) => d.to_string(),
        Data::Error(_) | Data::Empty => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn cells(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_rows_are_keyed_and_numbered() {
        let rows = rows_from_cells(
            &header(&["Title", "Description", "Code"]),
            vec![cells(&["Tea", "Leaf", "1001"]), cells(&["Milk", " Dairy ", "1002"])],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].number, 1);
        assert_eq!(rows[1].text("Description"), "Dairy");
        assert_eq!(rows[1].field("Missing"), None);
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let rows = rows_from_cells(
            &header(&["Title", "Code"]),
            vec![cells(&["A", "1"]), cells(&["", "  "]), cells(&["B", "2"])],
        );
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].number, 2);
        assert_eq!(rows[1].text("Title"), "B");
    }

    #[test]
    fn test_blank_cells_are_absent() {
        let rows = rows_from_cells(&header(&["Title", "Code"]), vec![cells(&["A", " "])]);
        assert_eq!(rows[0].field("Code"), None);
    }

    #[test]
    fn test_numeric_cells_render_like_input() {
        assert_eq!(cell_text(&Data::Float(1001.0)), "1001");
        assert_eq!(cell_text(&Data::Float(12.5)), "12.5");
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        assert!(matches!(read_rows(b""), Err(SpreadsheetError::EmptyUpload)));
        assert!(read_rows(b"definitely not a workbook").is_err());
    }
}
