//! Classifier Client: the only translation layer between the external
//! model's schema-unguaranteed output and the closed, typed
//! [`Classification`] shape the rest of the system operates on.

use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;
use crate::feedback::models::{Category, Classification, RawFeedbackItem, Sentiment, Urgency};
use crate::feedback::prompts::{CLASSIFY_PROMPT, CLASSIFY_SYSTEM};
use crate::llm_client::LlmClient;

/// Classifies a single feedback item with one outbound model call.
///
/// Empty text (after trimming) fails with a validation error before any
/// network traffic. An unparseable or incomplete model response fails with
/// a classification error; callers running batches skip such items.
pub async fn classify(llm: &LlmClient, item: &RawFeedbackItem) -> Result<Classification, AppError> {
    let text = item.text.trim();
    if text.is_empty() {
        return Err(AppError::Validation(
            "feedback text must not be empty".to_string(),
        ));
    }

    let prompt = CLASSIFY_PROMPT
        .replace("{feedback_text}", text)
        .replace("{source}", &item.source);

    let raw: Value = llm
        .call_json(&prompt, CLASSIFY_SYSTEM)
        .await
        .map_err(|e| AppError::Classification(format!("model call failed: {e}")))?;

    parse_classification(&raw, item)
}

/// Classifies a batch sequentially, skipping items that fail.
///
/// One malformed model response never blocks the rest of the run; skipped
/// items are logged and counted. Calls are sequential to stay friendly to
/// the external API's rate limits.
pub async fn classify_batch(
    llm: &LlmClient,
    items: &[RawFeedbackItem],
) -> (Vec<Classification>, usize) {
    let mut classified = Vec::with_capacity(items.len());
    let mut skipped = 0usize;

    for item in items {
        match classify(llm, item).await {
            Ok(c) => classified.push(c),
            Err(e) => {
                skipped += 1;
                warn!(
                    feedback_id = item.feedback_id,
                    source = %item.source,
                    "skipping feedback item: {e}"
                );
            }
        }
    }

    (classified, skipped)
}

/// Validates and coerces the model's raw JSON into a [`Classification`].
///
/// All seven classification fields must be present. Enum strings are
/// coerced into their closed sets; numeric fields are clamped into range
/// rather than rejected, since out-of-range values are acceptable model
/// noise.
pub(crate) fn parse_classification(
    raw: &Value,
    item: &RawFeedbackItem,
) -> Result<Classification, AppError> {
    let sentiment = Sentiment::from_model(str_field(raw, "sentiment")?);
    let sentiment_score = num_field(raw, "sentiment_score")?.clamp(-1.0, 1.0);
    let category = Category::from_model(str_field(raw, "category")?);
    let urgency_level = Urgency::from_model(str_field(raw, "urgency_level")?);
    let priority_score = num_field(raw, "priority_score")?.round().clamp(0.0, 100.0) as i64;
    let key_issue = str_field(raw, "key_issue")?.to_string();
    let suggested_action = str_field(raw, "suggested_action")?.to_string();

    Ok(Classification {
        feedback_id: item.feedback_id,
        feedback_text: item.text.trim().to_string(),
        source: item.source.clone(),
        sentiment,
        sentiment_score,
        category,
        urgency_level,
        priority_score,
        key_issue,
        suggested_action,
    })
}

fn str_field<'a>(raw: &'a Value, field: &str) -> Result<&'a str, AppError> {
    raw.get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::Classification(format!("model response missing field '{field}'")))
}

fn num_field(raw: &Value, field: &str) -> Result<f64, AppError> {
    raw.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| AppError::Classification(format!("model response missing field '{field}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item() -> RawFeedbackItem {
        RawFeedbackItem {
            feedback_id: 7,
            text: "The app crashes when I upload a photo".to_string(),
            source: "CSV Upload".to_string(),
        }
    }

    fn full_response() -> Value {
        json!({
            "sentiment": "negative",
            "sentiment_score": -0.8,
            "category": "Bug",
            "urgency_level": "critical",
            "priority_score": 92,
            "key_issue": "Crash on photo upload",
            "suggested_action": "Fix the upload handler"
        })
    }

    #[test]
    fn test_parse_full_response() {
        let c = parse_classification(&full_response(), &item()).unwrap();
        assert_eq!(c.feedback_id, 7);
        assert_eq!(c.sentiment, Sentiment::Negative);
        assert_eq!(c.category, Category::Bug);
        assert_eq!(c.urgency_level, Urgency::Critical);
        assert_eq!(c.priority_score, 92);
        assert_eq!(c.key_issue, "Crash on photo upload");
    }

    #[test]
    fn test_missing_field_is_classification_error() {
        let mut raw = full_response();
        raw.as_object_mut().unwrap().remove("urgency_level");
        let err = parse_classification(&raw, &item()).unwrap_err();
        assert!(matches!(err, AppError::Classification(_)));
    }

    #[test]
    fn test_out_of_range_scores_are_clamped() {
        let mut raw = full_response();
        raw["sentiment_score"] = json!(-4.2);
        raw["priority_score"] = json!(250);
        let c = parse_classification(&raw, &item()).unwrap();
        assert_eq!(c.sentiment_score, -1.0);
        assert_eq!(c.priority_score, 100);

        raw["sentiment_score"] = json!(3.0);
        raw["priority_score"] = json!(-10);
        let c = parse_classification(&raw, &item()).unwrap();
        assert_eq!(c.sentiment_score, 1.0);
        assert_eq!(c.priority_score, 0);
    }

    #[test]
    fn test_unknown_enum_values_are_coerced() {
        let mut raw = full_response();
        raw["sentiment"] = json!("outraged");
        raw["category"] = json!("Billing");
        raw["urgency_level"] = json!("asap");
        let c = parse_classification(&raw, &item()).unwrap();
        assert_eq!(c.sentiment, Sentiment::Neutral);
        assert_eq!(c.category, Category::Other);
        assert_eq!(c.urgency_level, Urgency::Medium);
    }

    #[tokio::test]
    async fn test_empty_text_rejected_before_model_call() {
        let llm = LlmClient::new("test-key".to_string());
        let empty = RawFeedbackItem {
            feedback_id: 1,
            text: "   ".to_string(),
            source: "CSV Upload".to_string(),
        };
        let err = classify(&llm, &empty).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
