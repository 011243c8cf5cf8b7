//! CSV ingestion adapter.
//!
//! Required column: `feedback_text` (a few common aliases are accepted).
//! Rows with empty feedback text are silently omitted from the output; the
//! caller reports them as skipped, not failed.

use crate::errors::AppError;
use crate::feedback::models::RawFeedbackItem;

pub const CSV_SOURCE: &str = "CSV Upload";

const TEXT_COLUMNS: &[&str] = &["feedback_text", "feedback", "text", "comment", "Feedback"];
const SOURCE_COLUMNS: &[&str] = &["source", "Source", "platform", "Platform", "channel", "Channel"];
const ID_COLUMN: &str = "id";

#[derive(Debug)]
pub struct ParsedCsv {
    pub items: Vec<RawFeedbackItem>,
    /// Data rows seen, including ones omitted for empty text.
    pub total_rows: usize,
}

pub fn parse_csv_feedback(bytes: &[u8]) -> Result<ParsedCsv, AppError> {
    let mut reader = csv::Reader::from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|e| AppError::Validation(format!("invalid CSV: {e}")))?
        .clone();

    let text_idx = find_column(&headers, TEXT_COLUMNS).ok_or_else(|| {
        AppError::Validation(
            "no feedback text column found; a 'feedback_text' column is required".to_string(),
        )
    })?;
    let id_idx = find_column(&headers, &[ID_COLUMN]);
    let source_idx = find_column(&headers, SOURCE_COLUMNS);

    let mut items = Vec::new();
    let mut total_rows = 0usize;

    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| AppError::Validation(format!("invalid CSV row: {e}")))?;
        total_rows += 1;

        let text = record.get(text_idx).unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }

        // Missing or non-numeric id falls back to the 1-based row number.
        let feedback_id = id_idx
            .and_then(|i| record.get(i))
            .and_then(|v| v.trim().parse::<i64>().ok())
            .unwrap_or(row as i64 + 1);

        let source = source_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(CSV_SOURCE)
            .to_string();

        items.push(RawFeedbackItem {
            feedback_id,
            text: text.to_string(),
            source,
        });
    }

    Ok(ParsedCsv { items, total_rows })
}

fn find_column(headers: &csv::StringRecord, candidates: &[&str]) -> Option<usize> {
    candidates
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skips_rows_with_empty_text() {
        let csv = b"id,feedback_text\n1,App crashes on login\n2,\n3,Great product";
        let parsed = parse_csv_feedback(csv).unwrap();
        assert_eq!(parsed.total_rows, 3);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].text, "App crashes on login");
        assert_eq!(parsed.items[1].feedback_id, 3);
    }

    #[test]
    fn test_accepts_feedback_column_alias() {
        let csv = b"feedback\nThe export button is hidden";
        let parsed = parse_csv_feedback(csv).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].source, CSV_SOURCE);
        assert_eq!(parsed.items[0].feedback_id, 1);
    }

    #[test]
    fn test_missing_text_column_is_validation_error() {
        let csv = b"id,rating\n1,5";
        let err = parse_csv_feedback(csv).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_source_column_alias_and_default() {
        let csv = b"feedback_text,Platform\nToo slow,App Store\nLove it,";
        let parsed = parse_csv_feedback(csv).unwrap();
        assert_eq!(parsed.items[0].source, "App Store");
        assert_eq!(parsed.items[1].source, CSV_SOURCE);
    }

    #[test]
    fn test_sequential_ids_when_id_column_absent() {
        let csv = b"feedback_text,rating\nfirst,4\n,2\nthird,5";
        let parsed = parse_csv_feedback(csv).unwrap();
        // Row numbering counts the omitted empty row.
        assert_eq!(parsed.items[0].feedback_id, 1);
        assert_eq!(parsed.items[1].feedback_id, 3);
    }

    #[test]
    fn test_headers_with_surrounding_whitespace() {
        let csv = b" feedback_text , id \nneeds dark mode,42";
        let parsed = parse_csv_feedback(csv).unwrap();
        assert_eq!(parsed.items[0].feedback_id, 42);
        assert_eq!(parsed.items[0].text, "needs dark mode");
    }
}
