//! The collection cycle: fetch from configured sources, classify, persist,
//! then notify. Both the manual trigger endpoint and the weekly scheduler
//! call [`run_collection`], so the scheduler stays swappable.

use serde::Serialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::feedback::classifier::classify_batch;
use crate::feedback::store;
use crate::report;
use crate::sources::{reddit, sheets};
use crate::state::AppState;

const FETCH_TIMEOUT_SECS: u64 = 20;
const USER_AGENT: &str = concat!("feedback-prioritizer/", env!("CARGO_PKG_VERSION"));

/// Outcome of one adapter within a run. A failed source carries its error
/// message; sibling sources still run.
#[derive(Debug, Clone, Serialize)]
pub struct SourceOutcome {
    pub source: String,
    pub items: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceOutcome {
    fn ok(source: impl Into<String>, items: usize) -> Self {
        Self {
            source: source.into(),
            items,
            error: None,
        }
    }

    fn failed(source: impl Into<String>, error: &AppError) -> Self {
        Self {
            source: source.into(),
            items: 0,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CollectionOutcome {
    /// Records actually persisted this run (after classification and dedup).
    pub items_collected: usize,
    /// Items the adapters produced.
    pub items_fetched: usize,
    /// Items dropped because classification failed or text was empty.
    pub items_skipped: usize,
    pub sources: Vec<SourceOutcome>,
}

/// Runs one collection cycle. Rejects overlapping runs; an absent or
/// disabled source configuration is a successful no-op.
pub async fn run_collection(state: &AppState) -> Result<CollectionOutcome, AppError> {
    let _guard = state
        .collection_lock
        .try_lock()
        .map_err(|_| AppError::Validation("a collection run is already in progress".to_string()))?;

    // The configuration is read once per run and threaded through the
    // adapters; nothing below re-reads it.
    let config = match store::get_source_config(&state.db).await? {
        Some(config) if config.enabled => config,
        _ => {
            info!("No enabled data source configuration; nothing to collect");
            return Ok(CollectionOutcome::default());
        }
    };

    let client = reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(std::time::Duration::from_secs(FETCH_TIMEOUT_SECS))
        .build()
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut items = Vec::new();
    let mut sources = Vec::new();

    if let Some(subreddit) = config.reddit_source() {
        let query = config.reddit_query.as_deref().unwrap_or("");
        let label = format!("Reddit r/{subreddit}");
        match reddit::fetch_reddit_feedback(&client, subreddit, query).await {
            Ok(fetched) => {
                sources.push(SourceOutcome::ok(&label, fetched.len()));
                items.extend(fetched);
            }
            Err(e) => {
                warn!("Reddit source failed: {e}");
                sources.push(SourceOutcome::failed(&label, &e));
            }
        }
    }

    if let Some(sheet_url) = config.sheets_source() {
        match sheets::fetch_sheet_feedback(&client, sheet_url).await {
            Ok(fetched) => {
                sources.push(SourceOutcome::ok(sheets::SHEETS_SOURCE, fetched.len()));
                items.extend(fetched);
            }
            Err(e) => {
                warn!("Google Sheets source failed: {e}");
                sources.push(SourceOutcome::failed(sheets::SHEETS_SOURCE, &e));
            }
        }
    }

    if items.is_empty() {
        info!("Collection run produced no feedback items");
        return Ok(CollectionOutcome {
            sources,
            ..CollectionOutcome::default()
        });
    }

    info!("Collected {} feedback items; classifying...", items.len());
    let (classified, skipped) = classify_batch(&state.llm, &items).await;

    let inserted = store::insert_many(&state.db, &classified).await?;
    store::mark_synced(&state.db, config.id).await?;
    info!(
        "Collection run complete: {} fetched, {} classified, {} persisted",
        items.len(),
        classified.len(),
        inserted
    );

    // Delivery failures are logged but never roll back persisted records.
    if let Err(e) = report::send_weekly_report(state).await {
        warn!("Report delivery after collection failed: {e}");
    }

    Ok(CollectionOutcome {
        items_collected: inserted as usize,
        items_fetched: items.len(),
        items_skipped: skipped,
        sources,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::feedback::store::tests::test_pool;
    use crate::llm_client::LlmClient;

    async fn test_state() -> AppState {
        let pool = test_pool().await;
        let config = Config {
            database_url: "sqlite::memory:".to_string(),
            gemini_api_key: "test-key".to_string(),
            port: 8080,
            rust_log: "info".to_string(),
            slack_webhook_url: None,
            sendgrid_api_key: None,
            sender_email: "noreply@example.com".to_string(),
            recipient_email: None,
        };
        AppState::new(pool, LlmClient::new("test-key".to_string()), config)
    }

    #[tokio::test]
    async fn test_no_configuration_is_a_successful_noop() {
        let state = test_state().await;
        let outcome = run_collection(&state).await.unwrap();
        assert_eq!(outcome.items_collected, 0);
        assert!(outcome.sources.is_empty());
        // No rows were written and no config row appeared.
        assert_eq!(store::count(&state.db).await.unwrap(), 0);
        assert!(store::get_source_config(&state.db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_disabled_configuration_is_a_successful_noop() {
        let state = test_state().await;
        let row = store::save_source_config(
            &state.db,
            &crate::feedback::models::SourceConfigInput {
                reddit_subreddit: Some("rust".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        sqlx::query("UPDATE data_sources SET enabled = 0 WHERE id = ?")
            .bind(row.id)
            .execute(&state.db)
            .await
            .unwrap();

        let outcome = run_collection(&state).await.unwrap();
        assert_eq!(outcome.items_collected, 0);

        // last_synced stays untouched.
        let row = store::get_source_config(&state.db).await.unwrap().unwrap();
        assert!(row.last_synced.is_none());
    }

    #[tokio::test]
    async fn test_overlapping_runs_are_rejected() {
        let state = test_state().await;
        let _held = state.collection_lock.clone().try_lock_owned().unwrap();
        let err = run_collection(&state).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
