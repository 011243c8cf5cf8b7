use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::collection::run_collection;
use crate::errors::AppError;
use crate::feedback::models::SourceConfigInput;
use crate::feedback::store;
use crate::state::AppState;

/// GET /sources/get
pub async fn handle_get_sources(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    match store::get_source_config(&state.db).await? {
        Some(config) => Ok(Json(serde_json::to_value(config).map_err(|e| {
            AppError::Internal(anyhow::anyhow!("config serialization failed: {e}"))
        })?)),
        None => Ok(Json(json!({ "configured": false }))),
    }
}

/// POST /sources/configure
pub async fn handle_configure_sources(
    State(state): State<AppState>,
    Json(input): Json<SourceConfigInput>,
) -> Result<Json<Value>, AppError> {
    if !input.has_any_source() {
        return Err(AppError::Validation(
            "at least one data source is required".to_string(),
        ));
    }

    store::save_source_config(&state.db, &input).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Data sources configured successfully"
    })))
}

/// POST /test-collection
/// Manual trigger for the same collection cycle the weekly scheduler runs.
pub async fn handle_test_collection(
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let outcome = run_collection(&state).await?;
    Ok(Json(json!({
        "success": true,
        "items_collected": outcome.items_collected,
        "items_fetched": outcome.items_fetched,
        "items_skipped": outcome.items_skipped,
        "sources": outcome.sources,
    })))
}
