//! Google Sheets ingestion adapter.
//!
//! Works against public sheets only: the sheet id is pulled out of the
//! shared URL and the sheet is fetched through the CSV export endpoint.

use crate::errors::AppError;
use crate::feedback::models::RawFeedbackItem;

pub const SHEETS_SOURCE: &str = "Google Sheets";

const FEEDBACK_COLUMNS: &[&str] = &["feedback", "Feedback", "feedback_text", "comment", "Comment"];

pub async fn fetch_sheet_feedback(
    client: &reqwest::Client,
    sheet_url: &str,
) -> Result<Vec<RawFeedbackItem>, AppError> {
    let sheet_id = extract_sheet_id(sheet_url).ok_or_else(|| {
        AppError::Source(format!("not a Google Sheets URL: {sheet_url}"))
    })?;

    let csv_url = format!("https://docs.google.com/spreadsheets/d/{sheet_id}/export?format=csv");

    let response = client
        .get(&csv_url)
        .send()
        .await
        .map_err(|e| AppError::Source(format!("Google Sheets fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Source(format!(
            "Google Sheets export returned status {status}; is the sheet public?"
        )));
    }

    let body = response
        .text()
        .await
        .map_err(|e| AppError::Source(format!("Google Sheets fetch failed: {e}")))?;

    parse_sheet_csv(&body)
}

/// Extracts the sheet id from a `…/spreadsheets/d/<id>/…` URL.
pub(crate) fn extract_sheet_id(url: &str) -> Option<&str> {
    let after = url.split("/d/").nth(1)?;
    let id = after.split(['/', '?', '#']).next()?;
    (!id.is_empty()).then_some(id)
}

/// Parses the exported CSV, auto-detecting the feedback column (falling
/// back to the first column) and skipping rows with empty text.
pub(crate) fn parse_sheet_csv(body: &str) -> Result<Vec<RawFeedbackItem>, AppError> {
    let mut reader = csv::Reader::from_reader(body.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| AppError::Source(format!("sheet export was not CSV: {e}")))?
        .clone();

    let text_idx = FEEDBACK_COLUMNS
        .iter()
        .find_map(|name| headers.iter().position(|h| h.trim() == *name))
        .unwrap_or(0);

    let mut items = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record =
            record.map_err(|e| AppError::Source(format!("invalid sheet row: {e}")))?;
        let text = record.get(text_idx).unwrap_or("").trim();
        if text.is_empty() {
            continue;
        }
        items.push(RawFeedbackItem {
            feedback_id: row as i64 + 1,
            text: text.to_string(),
            source: SHEETS_SOURCE.to_string(),
        });
    }

    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_sheet_id() {
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets/d/1AbC_def/edit#gid=0"),
            Some("1AbC_def")
        );
        assert_eq!(
            extract_sheet_id("https://docs.google.com/spreadsheets/d/1AbC_def"),
            Some("1AbC_def")
        );
        assert_eq!(extract_sheet_id("https://example.com/not-a-sheet"), None);
        assert_eq!(extract_sheet_id("https://docs.google.com/spreadsheets/d/"), None);
    }

    #[test]
    fn test_parse_detects_feedback_column() {
        let body = "Timestamp,Feedback\n2025-01-01,Checkout is confusing\n2025-01-02,\n";
        let items = parse_sheet_csv(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "Checkout is confusing");
        assert_eq!(items[0].source, SHEETS_SOURCE);
    }

    #[test]
    fn test_parse_falls_back_to_first_column() {
        let body = "Response\nLove the new editor\nPlease add offline mode\n";
        let items = parse_sheet_csv(body).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].feedback_id, 1);
        assert_eq!(items[1].feedback_id, 2);
    }
}
