use std::sync::Arc;

use moondance_pipeline::ExtractionPipeline;
use moondance_storage::ObjectStore;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: moondance_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Object store holding the original uploaded files.
    pub store: Arc<dyn ObjectStore>,
    /// Content-extraction pipeline (submission handle).
    pub pipeline: Arc<ExtractionPipeline>,
}
