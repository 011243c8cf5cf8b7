//! Feedback Store: the only component that touches the underlying tables.
//!
//! Records are append-only; retried batches stay idempotent because inserts
//! dedup on `(feedback_id, source, feedback_text)`. Source configuration is
//! a single-row upsert that preserves `created_at` across saves.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::errors::AppError;
use crate::feedback::models::{
    Classification, ClassifiedFeedback, SourceConfigInput, SourceConfigRow,
};

/// Inserts a batch of classifications in one transaction, assigning `id`
/// and `created_at`. Rows whose `(feedback_id, source, feedback_text)`
/// triple already exists are skipped, so retrying a batch or re-running a
/// collection over unchanged source data does not duplicate. The text is
/// part of the key because CSV and Sheets ids are row positions: a later
/// batch legitimately re-uses them for new feedback, and an edited row
/// keeps its position but changes its text. Returns the number of rows
/// actually inserted.
pub async fn insert_many(pool: &SqlitePool, items: &[Classification]) -> Result<u64, AppError> {
    let mut tx = pool.begin().await?;
    let now = Utc::now();
    let mut inserted = 0u64;

    for item in items {
        let result = sqlx::query(
            r#"
            INSERT INTO feedback_analysis
                (feedback_id, feedback_text, source, sentiment, sentiment_score,
                 category, urgency_level, priority_score, key_issue, suggested_action,
                 created_at)
            SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
            WHERE NOT EXISTS (
                SELECT 1 FROM feedback_analysis
                WHERE feedback_id = ? AND source = ? AND feedback_text = ?
            )
            "#,
        )
        .bind(item.feedback_id)
        .bind(&item.feedback_text)
        .bind(&item.source)
        .bind(item.sentiment)
        .bind(item.sentiment_score)
        .bind(item.category)
        .bind(item.urgency_level)
        .bind(item.priority_score)
        .bind(&item.key_issue)
        .bind(&item.suggested_action)
        .bind(now)
        .bind(item.feedback_id)
        .bind(&item.source)
        .bind(&item.feedback_text)
        .execute(&mut *tx)
        .await?;

        inserted += result.rows_affected();
    }

    tx.commit().await?;
    Ok(inserted)
}

/// Full scan. Callers derive any ordering they need.
pub async fn all(pool: &SqlitePool) -> Result<Vec<ClassifiedFeedback>, AppError> {
    let records = sqlx::query_as::<_, ClassifiedFeedback>("SELECT * FROM feedback_analysis")
        .fetch_all(pool)
        .await?;
    Ok(records)
}

/// Top `n` records by priority, most recent first among ties.
pub async fn top_n_by_priority(
    pool: &SqlitePool,
    n: i64,
) -> Result<Vec<ClassifiedFeedback>, AppError> {
    let records = sqlx::query_as::<_, ClassifiedFeedback>(
        r#"
        SELECT * FROM feedback_analysis
        ORDER BY priority_score DESC, created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(n)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// Top `n` records persisted since `since`, for the weekly report window.
pub async fn top_since(
    pool: &SqlitePool,
    since: DateTime<Utc>,
    n: i64,
) -> Result<Vec<ClassifiedFeedback>, AppError> {
    let records = sqlx::query_as::<_, ClassifiedFeedback>(
        r#"
        SELECT * FROM feedback_analysis
        WHERE created_at >= ?
        ORDER BY priority_score DESC, created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(since)
    .bind(n)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

/// One page of records in priority order.
pub async fn page(
    pool: &SqlitePool,
    limit: i64,
    offset: i64,
) -> Result<Vec<ClassifiedFeedback>, AppError> {
    let records = sqlx::query_as::<_, ClassifiedFeedback>(
        r#"
        SELECT * FROM feedback_analysis
        ORDER BY priority_score DESC, created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;
    Ok(records)
}

pub async fn count(pool: &SqlitePool) -> Result<i64, AppError> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM feedback_analysis")
        .fetch_one(pool)
        .await?;
    Ok(total)
}

/// Single-query aggregates for the quick-stats endpoint.
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct QuickStats {
    pub total: i64,
    pub avg_priority: f64,
    pub critical_count: i64,
    pub negative_count: i64,
}

pub async fn quick_stats(pool: &SqlitePool) -> Result<QuickStats, AppError> {
    let stats = sqlx::query_as::<_, QuickStats>(
        r#"
        SELECT
            COUNT(*) AS total,
            COALESCE(AVG(priority_score), 0.0) AS avg_priority,
            COALESCE(SUM(CASE WHEN urgency_level = 'critical' THEN 1 ELSE 0 END), 0) AS critical_count,
            COALESCE(SUM(CASE WHEN sentiment = 'negative' THEN 1 ELSE 0 END), 0) AS negative_count
        FROM feedback_analysis
        "#,
    )
    .fetch_one(pool)
    .await?;
    Ok(stats)
}

/// Returns the current source configuration, if one has been saved.
pub async fn get_source_config(pool: &SqlitePool) -> Result<Option<SourceConfigRow>, AppError> {
    let row = sqlx::query_as::<_, SourceConfigRow>(
        "SELECT * FROM data_sources ORDER BY id DESC LIMIT 1",
    )
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Upserts the single active configuration row: an existing row keeps its
/// `created_at` and has only its mutable fields replaced.
pub async fn save_source_config(
    pool: &SqlitePool,
    input: &SourceConfigInput,
) -> Result<SourceConfigRow, AppError> {
    match get_source_config(pool).await? {
        Some(existing) => {
            sqlx::query(
                r#"
                UPDATE data_sources
                SET reddit_subreddit = ?, reddit_query = ?, google_sheet_url = ?, enabled = 1
                WHERE id = ?
                "#,
            )
            .bind(&input.reddit_subreddit)
            .bind(&input.reddit_query)
            .bind(&input.google_sheet_url)
            .bind(existing.id)
            .execute(pool)
            .await?;
        }
        None => {
            sqlx::query(
                r#"
                INSERT INTO data_sources
                    (reddit_subreddit, reddit_query, google_sheet_url, enabled, created_at)
                VALUES (?, ?, ?, 1, ?)
                "#,
            )
            .bind(&input.reddit_subreddit)
            .bind(&input.reddit_query)
            .bind(&input.google_sheet_url)
            .bind(Utc::now())
            .execute(pool)
            .await?;
        }
    }

    get_source_config(pool)
        .await?
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("source config missing after save")))
}

/// Stamps `last_synced` after a successful collection cycle.
pub async fn mark_synced(pool: &SqlitePool, config_id: i64) -> Result<(), AppError> {
    sqlx::query("UPDATE data_sources SET last_synced = ? WHERE id = ?")
        .bind(Utc::now())
        .bind(config_id)
        .execute(pool)
        .await?;
    Ok(())
}
