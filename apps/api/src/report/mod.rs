//! Report Formatter: renders aggregated feedback into the weekly report
//! and hands it to the configured notification sinks.

pub mod handlers;
pub mod notify;

use chrono::{Duration, Utc};
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::AppError;
use crate::feedback::models::{Classification, ClassifiedFeedback, Urgency};
use crate::feedback::store;
use crate::state::AppState;

use notify::{build_sinks, slack_sink, Notifier};

/// How many days of records the weekly report covers.
const REPORT_WINDOW_DAYS: i64 = 7;
/// How many issues the report lists.
const REPORT_ISSUE_LIMIT: i64 = 10;
/// How many issues the short Slack rendering lists.
const SLACK_ISSUE_LIMIT: usize = 5;

/// A report rendered once and delivered to every sink. Sinks pick the body
/// that suits their medium.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

impl RenderedReport {
    /// The weekly top-priority report.
    pub fn weekly(top_issues: &[ClassifiedFeedback]) -> Self {
        let today = Utc::now().format("%B %d, %Y");

        let mut text = String::from("Weekly Top Priority Issues\n\n");
        for issue in top_issues.iter().take(SLACK_ISSUE_LIMIT) {
            text.push_str(&format!(
                "{} *{}* (Priority: {})\n   Category: {} | Action: {}\n\n",
                urgency_marker(issue.urgency_level),
                issue.key_issue,
                issue.priority_score,
                issue.category.as_str(),
                issue.suggested_action
            ));
        }
        if top_issues.is_empty() {
            text.push_str("No feedback recorded this week.\n");
        }

        let mut html = format!(
            "<html><body>\
             <h1>Weekly Feedback Priority Report</h1><p>{today}</p>\
             <h2>Top {} Priority Issues</h2>",
            top_issues.len()
        );
        for issue in top_issues {
            html.push_str(&format!(
                "<div style=\"border-left: 4px solid {}; padding: 15px; margin: 15px 0;\">\
                 <div><strong>Priority: {}/100</strong></div>\
                 <p><strong>Issue:</strong> {}</p>\
                 <p><strong>Category:</strong> {} | <strong>Urgency:</strong> {}</p>\
                 <p><strong>Suggested Action:</strong> {}</p></div>",
                urgency_color(issue.urgency_level),
                issue.priority_score,
                issue.key_issue,
                issue.category.as_str(),
                issue.urgency_level.as_str(),
                issue.suggested_action
            ));
        }
        html.push_str(
            "<p>This is an automated weekly report from your Feedback Prioritizer system.</p>\
             </body></html>",
        );

        RenderedReport {
            subject: format!("Weekly Feedback Report - {}", Utc::now().format("%b %d, %Y")),
            text_body: text,
            html_body: html,
        }
    }

    /// Short alert listing critical issues from a just-processed batch.
    pub fn critical_alert(issues: &[Classification]) -> Self {
        let mut text = String::from("Critical Feedback Alert\n\n");
        for issue in issues.iter().take(SLACK_ISSUE_LIMIT) {
            text.push_str(&format!(
                "{} *{}* (Priority: {})\n   Category: {} | Action: {}\n\n",
                urgency_marker(issue.urgency_level),
                issue.key_issue,
                issue.priority_score,
                issue.category.as_str(),
                issue.suggested_action
            ));
        }

        RenderedReport {
            subject: "Critical Feedback Alert".to_string(),
            html_body: format!("<html><body><pre>{text}</pre></body></html>"),
            text_body: text,
        }
    }
}

fn urgency_marker(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "\u{1F534}", // red circle
        Urgency::High => "\u{1F7E0}",     // orange circle
        Urgency::Medium => "\u{1F7E1}",   // yellow circle
        Urgency::Low => "\u{1F7E2}",      // green circle
    }
}

fn urgency_color(urgency: Urgency) -> &'static str {
    match urgency {
        Urgency::Critical => "#DC2626",
        Urgency::High => "#F59E0B",
        Urgency::Medium => "#FCD34D",
        Urgency::Low => "#10B981",
    }
}

/// Builds the weekly report from the last seven days of records and sends
/// it to every configured sink. Every sink is attempted; the first failure
/// does not stop the rest, and delivery failures never touch stored data.
pub async fn send_weekly_report(state: &AppState) -> Result<(), AppError> {
    let since = Utc::now() - Duration::days(REPORT_WINDOW_DAYS);
    let top_issues = store::top_since(&state.db, since, REPORT_ISSUE_LIMIT).await?;
    let report = RenderedReport::weekly(&top_issues);

    let sinks = build_sinks(&state.config);
    if sinks.is_empty() {
        info!("No notification sinks configured; skipping report delivery");
        return Ok(());
    }

    deliver(&sinks, &report).await
}

/// Sends a critical-issues alert to Slack after a batch produced critical
/// records. A no-op when Slack is not configured.
pub async fn send_critical_alert(
    config: &Config,
    records: &[Classification],
) -> Result<(), AppError> {
    let critical: Vec<Classification> = records
        .iter()
        .filter(|r| r.urgency_level == Urgency::Critical)
        .cloned()
        .collect();
    if critical.is_empty() {
        return Ok(());
    }

    let Some(sink) = slack_sink(config) else {
        return Ok(());
    };

    let report = RenderedReport::critical_alert(&critical);
    deliver(&[sink], &report).await
}

async fn deliver(sinks: &[Box<dyn Notifier>], report: &RenderedReport) -> Result<(), AppError> {
    let mut failures = Vec::new();
    for sink in sinks {
        match sink.notify(report).await {
            Ok(()) => info!("Report delivered via {}", sink.name()),
            Err(e) => {
                warn!("Report delivery via {} failed: {e}", sink.name());
                failures.push(format!("{}: {e}", sink.name()));
            }
        }
    }

    if failures.is_empty() {
        Ok(())
    } else {
        Err(AppError::Notification(failures.join("; ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feedback::models::{Category, Sentiment};
    use chrono::TimeZone;

    fn issue(id: i64, urgency: Urgency, priority: i64) -> ClassifiedFeedback {
        ClassifiedFeedback {
            id,
            feedback_id: id,
            feedback_text: "text".to_string(),
            source: "CSV Upload".to_string(),
            sentiment: Sentiment::Negative,
            sentiment_score: -0.7,
            category: Category::Bug,
            urgency_level: urgency,
            priority_score: priority,
            key_issue: format!("issue {id}"),
            suggested_action: format!("action {id}"),
            created_at: Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_weekly_report_lists_issues() {
        let issues = vec![issue(1, Urgency::Critical, 95), issue(2, Urgency::Low, 12)];
        let report = RenderedReport::weekly(&issues);
        assert!(report.subject.starts_with("Weekly Feedback Report"));
        assert!(report.text_body.contains("issue 1"));
        assert!(report.text_body.contains("Priority: 95"));
        assert!(report.html_body.contains("issue 2"));
        assert!(report.html_body.contains("#DC2626"));
    }

    #[test]
    fn test_weekly_report_empty_week() {
        let report = RenderedReport::weekly(&[]);
        assert!(report.text_body.contains("No feedback recorded this week"));
    }

    #[test]
    fn test_slack_rendering_caps_issue_count() {
        let issues: Vec<ClassifiedFeedback> =
            (1..=8).map(|i| issue(i, Urgency::High, 70)).collect();
        let report = RenderedReport::weekly(&issues);
        assert!(report.text_body.contains("issue 5"));
        assert!(!report.text_body.contains("issue 6"));
        // The HTML body keeps the full list.
        assert!(report.html_body.contains("issue 8"));
    }

    #[test]
    fn test_critical_alert_rendering() {
        let alert = Classification {
            feedback_id: 3,
            feedback_text: "text".to_string(),
            source: "CSV Upload".to_string(),
            sentiment: Sentiment::Negative,
            sentiment_score: -0.9,
            category: Category::Bug,
            urgency_level: Urgency::Critical,
            priority_score: 99,
            key_issue: "issue 3".to_string(),
            suggested_action: "hotfix".to_string(),
        };
        let report = RenderedReport::critical_alert(&[alert]);
        assert_eq!(report.subject, "Critical Feedback Alert");
        assert!(report.text_body.contains("issue 3"));
        assert!(report.text_body.contains("Priority: 99"));
    }
}
