use axum::{
    extract::{Multipart, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::feedback::classifier::classify_batch;
use crate::feedback::models::ClassifiedFeedback;
use crate::feedback::stats::{self, Stats};
use crate::feedback::store;
use crate::report;
use crate::sources::csv::parse_csv_feedback;
use crate::state::AppState;

/// How many records the dashboard feedback list carries.
const DASHBOARD_LIST_LIMIT: i64 = 100;

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub processed: u64,
    pub skipped: usize,
    pub total: usize,
}

/// POST /upload
/// Accepts a multipart CSV, classifies every non-empty row, and persists
/// the batch. Rows with empty text and rows the model fails on are counted
/// as skipped, never aborting the upload.
pub async fn handle_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError> {
    let mut file_bytes = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart upload: {e}")))?
    {
        if field.name() == Some("file") || field.file_name().is_some() {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("failed to read upload: {e}")))?;
            file_bytes = Some(bytes);
            break;
        }
    }

    let file_bytes =
        file_bytes.ok_or_else(|| AppError::Validation("no file uploaded".to_string()))?;
    if file_bytes.is_empty() {
        return Err(AppError::Validation("uploaded file is empty".to_string()));
    }

    let parsed = parse_csv_feedback(&file_bytes)?;
    info!(
        "Upload parsed: {} rows, {} with feedback text",
        parsed.total_rows,
        parsed.items.len()
    );

    let (classified, classify_skipped) = classify_batch(&state.llm, &parsed.items).await;
    let inserted = store::insert_many(&state.db, &classified).await?;

    // Alert on critical issues from this batch; delivery failures are
    // logged and never fail the upload.
    if let Err(e) = report::send_critical_alert(&state.config, &classified).await {
        warn!("Critical alert delivery failed: {e}");
    }

    let empty_rows = parsed.total_rows - parsed.items.len();
    Ok(Json(UploadResponse {
        success: true,
        processed: inserted,
        skipped: empty_rows + classify_skipped,
        total: parsed.total_rows,
    }))
}

#[derive(Serialize)]
pub struct DashboardResponse {
    pub stats: Stats,
    pub feedbacks: Vec<ClassifiedFeedback>,
    pub top_priority: Vec<ClassifiedFeedback>,
}

/// GET /dashboard
pub async fn handle_dashboard(
    State(state): State<AppState>,
) -> Result<Json<DashboardResponse>, AppError> {
    let records = store::all(&state.db).await?;
    let stats = stats::compute(&records);
    let feedbacks = store::top_n_by_priority(&state.db, DASHBOARD_LIST_LIMIT).await?;
    let top_priority = stats.top_priority.clone();

    Ok(Json(DashboardResponse {
        stats,
        feedbacks,
        top_priority,
    }))
}

#[derive(Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

/// Saturating so an absurdly large `page` yields an empty page instead of
/// overflowing into a negative offset.
fn page_offset(page: i64, per_page: i64) -> i64 {
    (page - 1).saturating_mul(per_page)
}

/// GET /feedback
/// Paginated records in priority order.
pub async fn handle_list_feedback(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> Result<Json<serde_json::Value>, AppError> {
    let page = params.page.max(1);
    let per_page = params.per_page.clamp(1, 100);
    let offset = page_offset(page, per_page);

    let data = store::page(&state.db, per_page, offset).await?;
    let total = store::count(&state.db).await?;

    Ok(Json(json!({
        "page": page,
        "per_page": per_page,
        "total": total,
        "data": data,
    })))
}

/// GET /stats
pub async fn handle_quick_stats(
    State(state): State<AppState>,
) -> Result<Json<store::QuickStats>, AppError> {
    let stats = store::quick_stats(&state.db).await?;
    Ok(Json(stats))
}

/// GET /export
/// All records as a CSV attachment, priority order.
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let records = store::top_n_by_priority(&state.db, i64::MAX).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in &records {
        writer
            .serialize(record)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV export failed: {e}")))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("CSV export failed: {e}")))?;

    let filename = format!("feedback_{}.csv", Utc::now().format("%Y%m%d"));
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_offset() {
        assert_eq!(page_offset(1, 20), 0);
        assert_eq!(page_offset(3, 20), 40);
        // A hostile page number must not overflow the offset arithmetic.
        assert_eq!(page_offset(i64::MAX, 100), i64::MAX);
    }
}
