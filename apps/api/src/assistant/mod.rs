//! Query Assistant: free-text questions over the aggregated feedback data.
//!
//! Unlike the classifier, the model's answer is opaque prose and is
//! returned verbatim; no structural parsing is attempted.

pub mod handlers;
pub mod prompts;

use std::collections::BTreeMap;

use crate::errors::AppError;
use crate::feedback::models::ClassifiedFeedback;
use crate::feedback::stats::Stats;
use crate::llm_client::LlmClient;

use prompts::{ASSISTANT_PROMPT, ASSISTANT_SYSTEM};

const CONTEXT_TOP_ISSUES: usize = 5;

/// Answers a question by rendering the current stats into a textual context
/// and forwarding both to the model. Empty questions are rejected before
/// any network call.
pub async fn answer(
    llm: &LlmClient,
    question: &str,
    stats: &Stats,
    records: &[ClassifiedFeedback],
) -> Result<String, AppError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AppError::Validation(
            "question must not be empty".to_string(),
        ));
    }

    let context = render_stats_context(stats, records);
    let prompt = ASSISTANT_PROMPT
        .replace("{context}", &context)
        .replace("{question}", question);

    let response = llm
        .call(&prompt, ASSISTANT_SYSTEM)
        .await
        .map_err(|e| AppError::Llm(format!("assistant call failed: {e}")))?;

    response
        .text()
        .map(str::to_string)
        .ok_or_else(|| AppError::Llm("assistant returned empty content".to_string()))
}

/// Textual rendering of the dashboard data the model answers from.
pub(crate) fn render_stats_context(stats: &Stats, records: &[ClassifiedFeedback]) -> String {
    let mut context = format!(
        "Current Dashboard Stats:\n- Total Feedback: {}\n\nUrgency Breakdown:\n\
         - Critical: {}\n- High: {}\n- Medium: {}\n- Low: {}\n",
        stats.total_feedback,
        stats.by_urgency.critical,
        stats.by_urgency.high,
        stats.by_urgency.medium,
        stats.by_urgency.low,
    );

    context.push_str(&format!(
        "\nSentiment Breakdown:\n- Positive: {}\n- Negative: {}\n- Neutral: {}\n",
        stats.by_sentiment.positive, stats.by_sentiment.negative, stats.by_sentiment.neutral,
    ));

    context.push_str("\nCategory Breakdown:\n");
    for (category, count) in &stats.by_category {
        context.push_str(&format!("- {category}: {count}\n"));
    }

    let mut by_source: BTreeMap<&str, i64> = BTreeMap::new();
    for record in records {
        *by_source.entry(record.source.as_str()).or_insert(0) += 1;
    }
    context.push_str("\nSources:\n");
    for (source, count) in by_source {
        context.push_str(&format!("- {source}: {count}\n"));
    }

    context.push_str(&format!(
        "\nAverage Priority Score: {:.1}\n",
        stats.avg_priority_score
    ));

    if !stats.top_priority.is_empty() {
        context.push_str(&format!("\nTop {CONTEXT_TOP_ISSUES} Priority Issues:\n"));
        for (idx, issue) in stats.top_priority.iter().take(CONTEXT_TOP_ISSUES).enumerate() {
            context.push_str(&format!(
                "{}. {} ({}) - Priority: {}\n",
                idx + 1,
                issue.key_issue,
                issue.category.as_str(),
                issue.priority_score
            ));
        }
    }

    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::models::{Category, Sentiment, Urgency};
    use crate::feedback::stats::compute;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, source: &str, priority: i64) -> ClassifiedFeedback {
        ClassifiedFeedback {
            id,
            feedback_id: id,
            feedback_text: "text".to_string(),
            source: source.to_string(),
            sentiment: Sentiment::Negative,
            sentiment_score: -0.4,
            category: Category::Performance,
            urgency_level: Urgency::High,
            priority_score: priority,
            key_issue: format!("issue {id}"),
            suggested_action: "action".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_empty_question_rejected_before_model_call() {
        let llm = LlmClient::new("test-key".to_string());
        let stats = compute(&[]);
        let err = answer(&llm, "  ", &stats, &[]).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_context_includes_breakdowns_and_top_issues() {
        let records = vec![
            record(1, "CSV Upload", 90),
            record(2, "Reddit r/rust", 55),
            record(3, "Reddit r/rust", 20),
        ];
        let stats = compute(&records);
        let context = render_stats_context(&stats, &records);

        assert!(context.contains("Total Feedback: 3"));
        assert!(context.contains("- High: 3"));
        assert!(context.contains("- Performance: 3"));
        assert!(context.contains("- Reddit r/rust: 2"));
        assert!(context.contains("- CSV Upload: 1"));
        assert!(context.contains("1. issue 1 (Performance) - Priority: 90"));
    }

    #[test]
    fn test_context_for_empty_dashboard() {
        let stats = compute(&[]);
        let context = render_stats_context(&stats, &[]);
        assert!(context.contains("Total Feedback: 0"));
        assert!(context.contains("Average Priority Score: 0.0"));
        assert!(!context.contains("Top 5 Priority Issues"));
    }
}
