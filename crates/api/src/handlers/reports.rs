//! Handlers for the moderation `/reports` resource.
//!
//! A report moves `pending -> reviewed | resolved | dismissed` exactly once.
//! Resolving a report tombstones the reported note as a side effect; vote
//! and report history stays intact behind the tombstone.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use moondance_core::error::CoreError;
use moondance_core::types::DbId;
use moondance_db::models::lookup::ReportStatus;
use moondance_db::models::report::{CreateReport, Report, ReviewReport};
use moondance_db::repositories::{NoteRepo, ReportRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/notes/{id}/reports
///
/// File a moderation report against a note. One report per (note, reporter).
pub async fn create_report(
    State(state): State<AppState>,
    user: AuthUser,
    Path(note_id): Path<DbId>,
    Json(input): Json<CreateReport>,
) -> AppResult<(StatusCode, Json<DataResponse<Report>>)> {
    if input.reason.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Report reason must not be empty".to_string(),
        )));
    }

    NoteRepo::find_active_by_id(&state.pool, note_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "Note",
            id: note_id,
        }))?;

    // Friendly duplicate check; the unique constraint on (note, reporter)
    // still backs this up under a race.
    if ReportRepo::exists_for(&state.pool, note_id, user.user_id).await? {
        return Err(AppError::Core(CoreError::Conflict(
            "You have already reported this note".to_string(),
        )));
    }

    let report = ReportRepo::create(&state.pool, note_id, user.user_id, &input).await?;
    tracing::info!(report_id = report.id, note_id, reporter_id = user.user_id, "Report filed");

    Ok((StatusCode::CREATED, Json(DataResponse { data: report })))
}

/// GET /api/v1/reports/pending
///
/// Moderation queue, oldest first. Admin only.
pub async fn list_pending(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<Report>>>> {
    let reports = ReportRepo::list_pending(&state.pool).await?;
    Ok(Json(DataResponse { data: reports }))
}

/// POST /api/v1/reports/{id}/review
///
/// Move a pending report to a terminal status. Admin only. Resolving the
/// report tombstones the offending note.
pub async fn review_report(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<ReviewReport>,
) -> AppResult<Json<DataResponse<Report>>> {
    let target = ReportStatus::from_id(input.status_id).ok_or_else(|| {
        AppError::Core(CoreError::Validation(format!(
            "Unknown report status id: {}",
            input.status_id
        )))
    })?;
    if target == ReportStatus::Pending {
        return Err(AppError::Core(CoreError::Validation(
            "A review must move the report to a terminal status".to_string(),
        )));
    }

    let reviewed = match ReportRepo::review(&state.pool, id, admin.user_id, &input).await? {
        Some(report) => report,
        // Zero rows: either the report does not exist or it was already
        // reviewed. Reviews are terminal, so the latter is a conflict.
        None => {
            return match ReportRepo::find_by_id(&state.pool, id).await? {
                Some(_) => Err(AppError::Core(CoreError::Conflict(
                    "Report has already been reviewed".to_string(),
                ))),
                None => Err(AppError::Core(CoreError::NotFound {
                    entity: "Report",
                    id,
                })),
            };
        }
    };

    if target == ReportStatus::Resolved {
        let tombstoned = NoteRepo::soft_delete(&state.pool, reviewed.note_id).await?;
        tracing::info!(
            report_id = reviewed.id,
            note_id = reviewed.note_id,
            tombstoned,
            "Report resolved",
        );
    }

    Ok(Json(DataResponse { data: reviewed }))
}
