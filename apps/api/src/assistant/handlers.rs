use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::assistant::answer;
use crate::errors::AppError;
use crate::feedback::{stats, store};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub question: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub success: bool,
    pub answer: String,
}

/// POST /chat
pub async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let records = store::all(&state.db).await?;
    let stats = stats::compute(&records);
    let answer = answer(&state.llm, &request.question, &stats, &records).await?;

    Ok(Json(ChatResponse {
        success: true,
        answer,
    }))
}
