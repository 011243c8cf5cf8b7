//! Aggregator: pure dashboard statistics over classified records.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::feedback::models::{ClassifiedFeedback, Sentiment, Urgency};

/// How many records `Stats::top_priority` carries.
pub const TOP_PRIORITY_LIMIT: usize = 10;

/// Counts per urgency level. Every level is always present, zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UrgencyCounts {
    pub critical: i64,
    pub high: i64,
    pub medium: i64,
    pub low: i64,
}

/// Counts per sentiment. Every sentiment is always present, zero-filled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SentimentCounts {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub total_feedback: i64,
    pub by_urgency: UrgencyCounts,
    pub by_sentiment: SentimentCounts,
    /// Categories actually present in the data; zero-count categories are
    /// omitted, unlike urgency and sentiment.
    pub by_category: BTreeMap<String, i64>,
    pub avg_priority_score: f64,
    pub top_priority: Vec<ClassifiedFeedback>,
}

/// Computes dashboard statistics. Pure and deterministic: the same record
/// set yields the same stats regardless of input order.
pub fn compute(records: &[ClassifiedFeedback]) -> Stats {
    let mut by_urgency = UrgencyCounts::default();
    let mut by_sentiment = SentimentCounts::default();
    let mut by_category: BTreeMap<String, i64> = BTreeMap::new();
    let mut priority_sum: i64 = 0;

    for record in records {
        match record.urgency_level {
            Urgency::Critical => by_urgency.critical += 1,
            Urgency::High => by_urgency.high += 1,
            Urgency::Medium => by_urgency.medium += 1,
            Urgency::Low => by_urgency.low += 1,
        }
        match record.sentiment {
            Sentiment::Positive => by_sentiment.positive += 1,
            Sentiment::Negative => by_sentiment.negative += 1,
            Sentiment::Neutral => by_sentiment.neutral += 1,
        }
        *by_category
            .entry(record.category.as_str().to_string())
            .or_insert(0) += 1;
        priority_sum += record.priority_score;
    }

    let total = records.len() as i64;
    let avg_priority_score = if total > 0 {
        priority_sum as f64 / total as f64
    } else {
        0.0
    };

    Stats {
        total_feedback: total,
        by_urgency,
        by_sentiment,
        by_category,
        avg_priority_score,
        top_priority: top_by_priority(records, TOP_PRIORITY_LIMIT),
    }
}

/// Sorts by priority descending, most recent first among ties, then by id
/// descending so the ordering stays deterministic even for records created
/// in the same batch.
fn top_by_priority(records: &[ClassifiedFeedback], limit: usize) -> Vec<ClassifiedFeedback> {
    let mut sorted: Vec<ClassifiedFeedback> = records.to_vec();
    sorted.sort_by(|a, b| {
        b.priority_score
            .cmp(&a.priority_score)
            .then(b.created_at.cmp(&a.created_at))
            .then(b.id.cmp(&a.id))
    });
    sorted.truncate(limit);
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::models::Category;
    use chrono::{TimeZone, Utc};

    fn record(id: i64, urgency: Urgency, sentiment: Sentiment, priority: i64) -> ClassifiedFeedback {
        ClassifiedFeedback {
            id,
            feedback_id: id,
            feedback_text: format!("feedback {id}"),
            source: "CSV Upload".to_string(),
            sentiment,
            sentiment_score: 0.0,
            category: Category::Bug,
            urgency_level: urgency,
            priority_score: priority,
            key_issue: "issue".to_string(),
            suggested_action: "action".to_string(),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_empty_input_yields_zeroed_stats() {
        let stats = compute(&[]);
        assert_eq!(stats.total_feedback, 0);
        assert_eq!(stats.avg_priority_score, 0.0);
        assert_eq!(stats.by_urgency, UrgencyCounts::default());
        assert_eq!(stats.by_sentiment, SentimentCounts::default());
        assert!(stats.by_category.is_empty());
        assert!(stats.top_priority.is_empty());
    }

    #[test]
    fn test_counts_and_average() {
        let records = vec![
            record(1, Urgency::Critical, Sentiment::Negative, 90),
            record(2, Urgency::Critical, Sentiment::Negative, 85),
            record(3, Urgency::Critical, Sentiment::Neutral, 80),
            record(4, Urgency::Low, Sentiment::Positive, 10),
        ];
        let stats = compute(&records);
        assert_eq!(stats.total_feedback, 4);
        assert_eq!(stats.by_urgency.critical, 3);
        assert_eq!(stats.by_urgency.low, 1);
        assert_eq!(stats.by_urgency.high, 0); // zero-filled, never omitted
        assert_eq!(stats.by_sentiment.negative, 2);
        assert_eq!(stats.by_sentiment.neutral, 1);
        assert_eq!(stats.by_category.get("Bug"), Some(&4));
        assert!((stats.avg_priority_score - 66.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_order_invariance() {
        let mut records = vec![
            record(1, Urgency::High, Sentiment::Negative, 70),
            record(2, Urgency::Medium, Sentiment::Neutral, 50),
            record(3, Urgency::Low, Sentiment::Positive, 20),
        ];
        let forward = compute(&records);
        records.reverse();
        let backward = compute(&records);

        assert_eq!(forward.total_feedback, backward.total_feedback);
        assert_eq!(forward.by_urgency, backward.by_urgency);
        assert_eq!(forward.by_sentiment, backward.by_sentiment);
        assert_eq!(forward.by_category, backward.by_category);
        assert_eq!(forward.avg_priority_score, backward.avg_priority_score);
        // top_priority ordering is identical too, because ties resolve by id.
        let forward_ids: Vec<i64> = forward.top_priority.iter().map(|r| r.id).collect();
        let backward_ids: Vec<i64> = backward.top_priority.iter().map(|r| r.id).collect();
        assert_eq!(forward_ids, backward_ids);
    }

    #[test]
    fn test_top_priority_ordering_and_tie_break() {
        let records: Vec<ClassifiedFeedback> = (1..=12)
            .map(|i| record(i, Urgency::Medium, Sentiment::Neutral, (i % 4) * 25))
            .collect();
        let stats = compute(&records);

        assert_eq!(stats.top_priority.len(), TOP_PRIORITY_LIMIT);
        for pair in stats.top_priority.windows(2) {
            assert!(pair[0].priority_score >= pair[1].priority_score);
            if pair[0].priority_score == pair[1].priority_score {
                // Same created_at in this fixture, so id decides.
                assert!(pair[0].id > pair[1].id);
            }
        }
    }
}
