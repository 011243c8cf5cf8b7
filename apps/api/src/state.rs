use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::config::Config;
use crate::llm_client::LlmClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub llm: LlmClient,
    pub config: Config,
    /// Guards against overlapping collection runs: a trigger that arrives
    /// while a run is in flight is rejected, not queued.
    pub collection_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(db: SqlitePool, llm: LlmClient, config: Config) -> Self {
        Self {
            db,
            llm,
            config,
            collection_lock: Arc::new(Mutex::new(())),
        }
    }
}
