//! Reddit ingestion adapter, built on the public JSON listing API.
//!
//! An empty query lists the subreddit's newest submissions; otherwise the
//! subreddit is searched, restricted to the past month. Fetches are capped
//! per run so classification cost stays predictable.

use serde::Deserialize;
use tracing::info;

use crate::errors::AppError;
use crate::feedback::models::RawFeedbackItem;

/// Upper bound on submissions fetched per collection run.
pub const REDDIT_FETCH_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Debug, Deserialize)]
struct Submission {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
}

pub async fn fetch_reddit_feedback(
    client: &reqwest::Client,
    subreddit: &str,
    query: &str,
) -> Result<Vec<RawFeedbackItem>, AppError> {
    let limit = REDDIT_FETCH_LIMIT.to_string();
    let query = query.trim();

    let request = if query.is_empty() {
        client
            .get(format!("https://www.reddit.com/r/{subreddit}/new.json"))
            .query(&[("limit", limit.as_str())])
    } else {
        client
            .get(format!("https://www.reddit.com/r/{subreddit}/search.json"))
            .query(&[
                ("q", query),
                ("limit", limit.as_str()),
                ("restrict_sr", "1"),
                ("t", "month"),
                ("sort", "new"),
            ])
    };

    let response = request
        .send()
        .await
        .map_err(|e| AppError::Source(format!("Reddit fetch failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        return Err(AppError::Source(format!(
            "Reddit API returned status {status} for r/{subreddit}"
        )));
    }

    let listing: Listing = response
        .json()
        .await
        .map_err(|e| AppError::Source(format!("Reddit response was not a listing: {e}")))?;

    let source = format!("Reddit r/{subreddit}");
    let items: Vec<RawFeedbackItem> = listing
        .data
        .children
        .into_iter()
        .take(REDDIT_FETCH_LIMIT)
        .enumerate()
        .filter_map(|(idx, child)| {
            let text = submission_text(&child.data.title, &child.data.selftext);
            if text.is_empty() {
                return None;
            }
            Some(RawFeedbackItem {
                feedback_id: submission_numeric_id(&child.data.id, idx),
                text,
                source: source.clone(),
            })
        })
        .collect();

    info!("Fetched {} submissions from r/{subreddit}", items.len());
    Ok(items)
}

/// Joins a submission's title and body into one feedback text.
fn submission_text(title: &str, selftext: &str) -> String {
    let title = title.trim();
    let selftext = selftext.trim();
    match (title.is_empty(), selftext.is_empty()) {
        (true, true) => String::new(),
        (false, true) => title.to_string(),
        (true, false) => selftext.to_string(),
        (false, false) => format!("{title}. {selftext}"),
    }
}

/// Maps Reddit's base-36 submission id into the numeric `feedback_id`
/// space; falls back to the 1-based position within the fetched page.
fn submission_numeric_id(id: &str, idx: usize) -> i64 {
    i64::from_str_radix(id.trim(), 36)
        .ok()
        .filter(|v| *v > 0)
        .unwrap_or(idx as i64 + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submission_text_joins_title_and_body() {
        assert_eq!(
            submission_text("App is broken", "It crashes on startup."),
            "App is broken. It crashes on startup."
        );
        assert_eq!(submission_text("Title only", "  "), "Title only");
        assert_eq!(submission_text("", "Body only"), "Body only");
        assert_eq!(submission_text(" ", ""), "");
    }

    #[test]
    fn test_submission_numeric_id_base36() {
        assert_eq!(submission_numeric_id("1abc", 0), 60024);
        // Non-base36 falls back to the page position.
        assert_eq!(submission_numeric_id("???", 4), 5);
        assert_eq!(submission_numeric_id("", 0), 1);
    }

    #[test]
    fn test_listing_deserialization() {
        let raw = r#"{
            "data": {
                "children": [
                    {"data": {"id": "1abc", "title": "Slow sync", "selftext": "Takes minutes."}}
                ]
            }
        }"#;
        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.title, "Slow sync");
    }
}
