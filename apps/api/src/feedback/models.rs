use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One unit of feedback pulled from a source, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFeedbackItem {
    /// Adapter-assigned identifier; sequential when the source carries none.
    /// Not unique across sources.
    pub feedback_id: i64,
    pub text: String,
    pub source: String,
}

/// Sentiment polarity. Unrecognized model output coerces to `Neutral`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    pub fn from_model(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            _ => Sentiment::Neutral,
        }
    }
}

/// Closed feedback category set. Unrecognized model output coerces to `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum Category {
    Bug,
    #[serde(rename = "Feature Request")]
    #[sqlx(rename = "Feature Request")]
    FeatureRequest,
    #[serde(rename = "UX Issue")]
    #[sqlx(rename = "UX Issue")]
    UxIssue,
    Performance,
    Pricing,
    Other,
}

impl Category {
    pub fn from_model(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "bug" => Category::Bug,
            "feature request" | "feature" => Category::FeatureRequest,
            "ux issue" | "ux" => Category::UxIssue,
            "performance" => Category::Performance,
            "pricing" => Category::Pricing,
            _ => Category::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Bug => "Bug",
            Category::FeatureRequest => "Feature Request",
            Category::UxIssue => "UX Issue",
            Category::Performance => "Performance",
            Category::Pricing => "Pricing",
            Category::Other => "Other",
        }
    }
}

/// Urgency level, ordered so that `Critical` compares greatest.
/// Unrecognized model output coerces to `Medium`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl Urgency {
    pub fn from_model(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "critical" => Urgency::Critical,
            "high" => Urgency::High,
            "medium" => Urgency::Medium,
            "low" => Urgency::Low,
            _ => Urgency::Medium,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Critical => "critical",
            Urgency::High => "high",
            Urgency::Medium => "medium",
            Urgency::Low => "low",
        }
    }
}

/// Classifier output for one feedback item, before persistence fields
/// (`id`, `created_at`) are assigned by the store.
#[derive(Debug, Clone, Serialize)]
pub struct Classification {
    pub feedback_id: i64,
    pub feedback_text: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub category: Category,
    pub urgency_level: Urgency,
    pub priority_score: i64,
    pub key_issue: String,
    pub suggested_action: String,
}

/// A persisted, classified feedback record. Append-only; never mutated.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct ClassifiedFeedback {
    pub id: i64,
    pub feedback_id: i64,
    pub feedback_text: String,
    pub source: String,
    pub sentiment: Sentiment,
    pub sentiment_score: f64,
    pub category: Category,
    pub urgency_level: Urgency,
    pub priority_score: i64,
    pub key_issue: String,
    pub suggested_action: String,
    pub created_at: DateTime<Utc>,
}

/// The single active data-source configuration row.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SourceConfigRow {
    pub id: i64,
    pub reddit_subreddit: Option<String>,
    pub reddit_query: Option<String>,
    pub google_sheet_url: Option<String>,
    pub enabled: bool,
    pub last_synced: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl SourceConfigRow {
    fn configured(field: &Option<String>) -> Option<&str> {
        field.as_deref().map(str::trim).filter(|v| !v.is_empty())
    }

    /// Subreddit to poll, or `None` when the Reddit source is disabled.
    pub fn reddit_source(&self) -> Option<&str> {
        Self::configured(&self.reddit_subreddit)
    }

    /// Sheet URL to read, or `None` when the Sheets source is disabled.
    pub fn sheets_source(&self) -> Option<&str> {
        Self::configured(&self.google_sheet_url)
    }
}

/// Mutable source-configuration fields accepted from the client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceConfigInput {
    #[serde(default)]
    pub reddit_subreddit: Option<String>,
    #[serde(default)]
    pub reddit_query: Option<String>,
    #[serde(default)]
    pub google_sheet_url: Option<String>,
}

impl SourceConfigInput {
    /// At least one collectable source must be set for a save to make sense.
    pub fn has_any_source(&self) -> bool {
        let set = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
        set(&self.reddit_subreddit) || set(&self.google_sheet_url)
    }
}
