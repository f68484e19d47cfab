pub mod health;
pub mod notes;
pub mod reports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /notes      upload, fetch, edit, delete, URLs, votes, report filing
/// /reports    moderation queue and review (admin)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/notes", notes::router())
        .nest("/reports", reports::router())
}
