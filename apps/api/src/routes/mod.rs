pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::assistant;
use crate::feedback;
use crate::report;
use crate::sources;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Feedback pipeline
        .route("/upload", post(feedback::handlers::handle_upload))
        .route("/dashboard", get(feedback::handlers::handle_dashboard))
        .route("/feedback", get(feedback::handlers::handle_list_feedback))
        .route("/stats", get(feedback::handlers::handle_quick_stats))
        .route("/export", get(feedback::handlers::handle_export))
        // Query assistant
        .route("/chat", post(assistant::handlers::handle_chat))
        // Data sources & collection
        .route("/sources/get", get(sources::handlers::handle_get_sources))
        .route(
            "/sources/configure",
            post(sources::handlers::handle_configure_sources),
        )
        .route(
            "/test-collection",
            post(sources::handlers::handle_test_collection),
        )
        // Reports
        .route("/send-email", post(report::handlers::handle_send_report))
        .with_state(state)
}
