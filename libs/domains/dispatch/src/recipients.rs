//! Recipient extraction from uploaded tabular files.
//!
//! Given raw bytes and a declared filename, produces an ordered, deduplicated
//! list of email-shaped addresses, or an empty list when nothing usable is
//! found. Unsupported extensions, corrupt bytes and zero valid addresses all
//! collapse into the same empty result; underlying parse failures are logged,
//! never propagated.

use std::collections::HashSet;
use std::io::Cursor;

use calamine::{open_workbook_auto_from_rs, Data, Reader};
use tracing::warn;

/// Header cells that mark the address column in a spreadsheet.
const RECIPIENT_HEADERS: &[&str] = &["email", "emails", "recipient", "recipients"];

/// Minimal email shape check: non-empty local part, an `@`, and a domain
/// with an interior dot and no second `@`. Deliberately permissive, no RFC
/// validation.
pub fn is_valid_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(head, tail)| !head.is_empty() && !tail.is_empty())
        }
        None => false,
    }
}

/// Extract recipient addresses from an uploaded file.
///
/// Addresses are trimmed and deduplicated literally (case is preserved, so
/// `A@x.com` and `a@x.com` are distinct) in first-seen order, which keeps
/// dispatch order deterministic for identical input bytes.
pub fn extract(bytes: &[u8], filename: &str) -> Vec<String> {
    if filename.ends_with(".csv") {
        extract_csv(bytes)
    } else if filename.ends_with(".xlsx") || filename.ends_with(".xls") {
        extract_sheet(bytes)
    } else {
        warn!(filename = %filename, "unsupported recipients file extension");
        Vec::new()
    }
}

/// Delimited text: every cell of every row is a candidate address.
fn extract_csv(bytes: &[u8]) -> Vec<String> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut collector = Collector::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                for cell in record.iter() {
                    collector.keep(cell);
                }
            }
            Err(err) => {
                warn!(error = %err, "failed to parse CSV recipients file");
                return Vec::new();
            }
        }
    }
    collector.into_recipients()
}

/// Spreadsheet: single-column extraction from the first worksheet.
fn extract_sheet(bytes: &[u8]) -> Vec<String> {
    let mut workbook = match open_workbook_auto_from_rs(Cursor::new(bytes.to_vec())) {
        Ok(workbook) => workbook,
        Err(err) => {
            warn!(error = %err, "failed to open spreadsheet recipients file");
            return Vec::new();
        }
    };

    let range = match workbook.worksheet_range_at(0) {
        Some(Ok(range)) => range,
        Some(Err(err)) => {
            warn!(error = %err, "failed to read worksheet");
            return Vec::new();
        }
        None => {
            warn!("spreadsheet has no worksheets");
            return Vec::new();
        }
    };

    let rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<_>>());
    collect_column(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

/// Single-column policy: if the first row carries a recognized header, use
/// that column for all subsequent rows; otherwise default to the first
/// column, treating the first row as data.
///
/// Whole-sheet scanning used to pick up unrelated spreadsheet data sitting
/// next to the address column, so spreadsheets narrow to one column while
/// CSV input keeps the scan-everything behavior.
fn collect_column<I>(rows: I) -> Vec<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut rows = rows.into_iter();
    let Some(first) = rows.next() else {
        return Vec::new();
    };

    let header_column = first
        .iter()
        .position(|cell| RECIPIENT_HEADERS.contains(&cell.trim().to_lowercase().as_str()));
    let column = header_column.unwrap_or(0);

    let mut collector = Collector::new();
    if header_column.is_none() {
        if let Some(cell) = first.get(column) {
            collector.keep(cell);
        }
    }
    for row in rows {
        if let Some(cell) = row.get(column) {
            collector.keep(cell);
        }
    }
    collector.into_recipients()
}

/// Ordered set of trimmed, email-shaped addresses.
struct Collector {
    seen: HashSet<String>,
    recipients: Vec<String>,
}

impl Collector {
    fn new() -> Self {
        Self {
            seen: HashSet::new(),
            recipients: Vec::new(),
        }
    }

    fn keep(&mut self, cell: &str) {
        let value = cell.trim();
        if is_valid_email(value) && self.seen.insert(value.to_string()) {
            self.recipients.push(value.to_string());
        }
    }

    fn into_recipients(self) -> Vec<String> {
        self.recipients
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_email_accepts_minimal_shape() {
        assert!(is_valid_email("a@x.com"));
        assert!(is_valid_email("first.last@sub.domain.org"));
    }

    #[test]
    fn test_is_valid_email_rejects_malformed_values() {
        assert!(!is_valid_email(""));
        assert!(!is_valid_email("plainaddress"));
        assert!(!is_valid_email("@x.com"));
        assert!(!is_valid_email("a@xcom"));
        assert!(!is_valid_email("a@x."));
        assert!(!is_valid_email("a@.com"));
        assert!(!is_valid_email("a@b@x.com"));
    }

    #[test]
    fn test_csv_scans_every_cell_and_dedups_literally() {
        let csv = b"a@x.com,note\nB@X.com ,b@x.com\na@x.com,other\n";
        let recipients = extract(csv, "list.csv");
        // Case is not normalized: B@X.com and b@x.com stay distinct.
        assert_eq!(recipients, vec!["a@x.com", "B@X.com", "b@x.com"]);
    }

    #[test]
    fn test_csv_ignores_non_email_cells() {
        let csv = b"Name,Email\nAlice,alice@x.com\nBob,not-an-email\n";
        let recipients = extract(csv, "list.csv");
        assert_eq!(recipients, vec!["alice@x.com"]);
    }

    #[test]
    fn test_csv_extraction_is_idempotent() {
        let csv = b"a@x.com\nb@x.com\na@x.com\n";
        let first = extract(csv, "list.csv");
        let second = extract(csv, "list.csv");
        assert_eq!(first, second);
        assert_eq!(first, vec!["a@x.com", "b@x.com"]);
    }

    #[test]
    fn test_unsupported_extension_yields_empty() {
        assert!(extract(b"a@x.com", "list.txt").is_empty());
        assert!(extract(b"a@x.com", "list").is_empty());
    }

    #[test]
    fn test_xlsx_selects_header_column_and_filters() {
        let bytes = include_bytes!("../testdata/recipients.xlsx");
        let recipients = extract(bytes, "list.xlsx");
        // The Email header picks column 1; non-email cells and the literal
        // duplicate are dropped, first-seen order is kept.
        assert_eq!(recipients, vec!["a@x.com", "B@X.com", "b@x.com"]);
    }

    #[test]
    fn test_corrupt_spreadsheet_bytes_yield_empty() {
        assert!(extract(b"definitely not a zip archive", "list.xlsx").is_empty());
    }

    #[test]
    fn test_empty_input_yields_empty() {
        assert!(extract(b"", "list.csv").is_empty());
        assert!(extract(b"", "list.xlsx").is_empty());
    }

    fn rows(rows: &[&[&str]]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| row.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn test_recognized_header_selects_that_column() {
        let sheet = rows(&[
            &["Name", "Recipients", "Backup"],
            &["Alice", "alice@x.com", "other@x.com"],
            &["Bob", "bob@x.com", "ignored@x.com"],
        ]);
        // Valid-looking addresses outside the detected column are ignored.
        assert_eq!(collect_column(sheet), vec!["alice@x.com", "bob@x.com"]);
    }

    #[test]
    fn test_header_match_is_case_insensitive_and_trimmed() {
        let sheet = rows(&[&["  EMAIL  "], &["a@x.com"]]);
        assert_eq!(collect_column(sheet), vec!["a@x.com"]);
    }

    #[test]
    fn test_no_recognized_header_defaults_to_first_column() {
        let sheet = rows(&[
            &["contact@x.com", "spare@x.com"],
            &["second@x.com", "ignored@x.com"],
        ]);
        // First row counts as data when no header is detected.
        assert_eq!(collect_column(sheet), vec!["contact@x.com", "second@x.com"]);
    }

    #[test]
    fn test_column_extraction_skips_short_and_blank_rows() {
        let sheet = rows(&[&["Email"], &[], &["a@x.com"], &[""], &["a@x.com"]]);
        assert_eq!(collect_column(sheet), vec!["a@x.com"]);
    }
}
