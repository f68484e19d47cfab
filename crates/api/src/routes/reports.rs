//! Route definitions for the moderation queue.
//!
//! Mounted at `/reports`. Filing a report lives under the note it targets
//! (`POST /notes/{id}/reports`).
//!
//! ```text
//! GET  /pending       -> list_pending (admin)
//! POST /{id}/review   -> review_report (admin)
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::reports;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/pending", get(reports::list_pending))
        .route("/{id}/review", post(reports::review_report))
}
