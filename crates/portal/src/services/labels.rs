//! Label sheet validation.
//!
//! Label uploads carry `Title`, `Description` and `Code` columns. Each row is
//! classified on its own; rejected rows are reported and left out of the
//! print run while the rest go through.

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::services::spreadsheet::SheetRow;

/// Why a label row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelRowError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Code must be numeric")]
    NonNumericCode,
    #[error("Duplicate Code ({0})")]
    DuplicateCode(String),
}

/// An accepted label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelRecord {
    /// The row number the label came from.
    pub id: usize,
    pub name: String,
    pub category: String,
    /// Product lookup URL encoded in the symbol.
    pub url: String,
    pub code: String,
}

/// Classification of one uploaded row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    Valid(LabelRecord),
    Invalid { row: usize, reason: LabelRowError },
}

impl RowOutcome {
    /// The message shown next to the upload, e.g. `Row 2: Duplicate Code (A)`.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Valid(_) => None,
            Self::Invalid { row, reason } => Some(format!("Row {row}: {reason}")),
        }
    }
}

/// Accepted labels and per-row error messages of one upload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelBatch {
    pub labels: Vec<LabelRecord>,
    pub errors: Vec<String>,
}

impl FromIterator<RowOutcome> for LabelBatch {
    fn from_iter<I: IntoIterator<Item = RowOutcome>>(iter: I) -> Self {
        let mut batch = Self::default();
        for outcome in iter {
            match outcome {
                RowOutcome::Valid(record) => batch.labels.push(record),
                invalid @ RowOutcome::Invalid { .. } => {
                    batch.errors.extend(invalid.message());
                }
            }
        }
        batch
    }
}

/// Classify every row in order. A code is only "seen" once its row is accepted.
#[must_use]
pub fn validate_rows(rows: &[SheetRow], lookup_base: &Url) -> Vec<RowOutcome> {
    let mut seen: HashSet<&str> = HashSet::new();

    rows.iter()
        .map(|row| {
            let (title, description, code) =
                match (row.field("Title"), row.field("Description"), row.field("Code")) {
                    (Some(t), Some(d), Some(c)) => (t, d, c),
                    _ => {
                        return RowOutcome::Invalid {
                            row: row.number,
                            reason: LabelRowError::MissingFields,
                        };
                    }
                };

            if !code.bytes().all(|b| b.is_ascii_digit()) {
                return RowOutcome::Invalid {
                    row: row.number,
                    reason: LabelRowError::NonNumericCode,
                };
            }

            if !seen.insert(code) {
                return RowOutcome::Invalid {
                    row: row.number,
                    reason: LabelRowError::DuplicateCode(code.to_string()),
                };
            }

            RowOutcome::Valid(LabelRecord {
                id: row.number,
                name: title.to_string(),
                category: description.to_string(),
                url: lookup_url(lookup_base, code),
                code: code.to_string(),
            })
        })
        .collect()
}

/// Validate rows and split them into labels and messages.
#[must_use]
pub fn build_batch(rows: &[SheetRow], lookup_base: &Url) -> LabelBatch {
    validate_rows(rows, lookup_base).into_iter().collect()
}

/// `<lookup base>/<code>`.
#[must_use]
pub fn lookup_url(base: &Url, code: &str) -> String {
    format!("{}/{code}", base.as_str().trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/product").unwrap()
    }

    fn row(number: usize, title: &str, description: &str, code: &str) -> SheetRow {
        SheetRow::new(
            number,
            [("Title", title), ("Description", description), ("Code", code)]
                .into_iter()
                .filter(|(_, v)| !v.is_empty()),
        )
    }

    #[test]
    fn test_accepted_row_shape() {
        let batch = build_batch(&[row(1, "Tea", "Leaf", "1001")], &base());
        assert!(batch.errors.is_empty());
        assert_eq!(
            batch.labels,
            vec![LabelRecord {
                id: 1,
                name: "Tea".to_string(),
                category: "Leaf".to_string(),
                url: "https://example.com/product/1001".to_string(),
                code: "1001".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_fields() {
        let batch = build_batch(&[row(1, "Tea", "", "1001")], &base());
        assert!(batch.labels.is_empty());
        assert_eq!(batch.errors, vec!["Row 1: Missing required fields"]);
    }

    #[test]
    fn test_non_numeric_code() {
        let batch = build_batch(&[row(1, "Tea", "Leaf", "10A1"), row(2, "Tea", "Leaf", "-5")], &base());
        assert_eq!(
            batch.errors,
            vec!["Row 1: Code must be numeric", "Row 2: Code must be numeric"]
        );
    }

    #[test]
    fn test_duplicate_keeps_first() {
        let outcomes = validate_rows(
            &[row(1, "A", "d", "1"), row(2, "B", "d", "1"), row(3, "C", "d", "2")],
            &base(),
        );
        assert!(matches!(&outcomes[0], RowOutcome::Valid(r) if r.name == "A"));
        assert_eq!(
            outcomes[1],
            RowOutcome::Invalid {
                row: 2,
                reason: LabelRowError::DuplicateCode("1".to_string()),
            }
        );
        assert!(matches!(&outcomes[2], RowOutcome::Valid(r) if r.id == 3));
    }

    #[test]
    fn test_rejected_code_is_not_remembered() {
        // Row 1 is rejected for a missing field, so row 2 is the first "7".
        let batch = build_batch(&[row(1, "", "d", "7"), row(2, "B", "d", "7")], &base());
        assert_eq!(batch.labels.len(), 1);
        assert_eq!(batch.labels[0].id, 2);
    }

    #[test]
    fn test_lookup_url_tolerates_trailing_slash() {
        let with_slash = Url::parse("https://shop.example/p/").unwrap();
        assert_eq!(lookup_url(&with_slash, "42"), "https://shop.example/p/42");
    }
}
