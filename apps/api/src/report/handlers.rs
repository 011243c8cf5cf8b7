use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::report::send_weekly_report;
use crate::state::AppState;

/// POST /send-email
/// Manually dispatches the weekly report to every configured sink.
pub async fn handle_send_report(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    send_weekly_report(&state).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Weekly report dispatched to configured sinks"
    })))
}
