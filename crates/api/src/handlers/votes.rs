//! Handlers for the `/notes/{id}/vote` resource.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use moondance_core::error::CoreError;
use moondance_core::types::DbId;
use moondance_db::models::vote::{CastVote, Vote, VoteAggregates};
use moondance_db::repositories::{RemoveVoteOutcome, VoteRepo};
use serde::Serialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// Typed response for vote mutations: the caller's vote plus the note's
/// recomputed aggregates.
#[derive(Debug, Serialize)]
pub struct VoteResult {
    pub vote: Vote,
    pub aggregates: VoteAggregates,
}

/// PUT /api/v1/notes/{id}/vote
///
/// Cast or replace the caller's vote. Idempotent per (note, user): a second
/// PUT overwrites, it never stacks.
pub async fn cast_vote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(note_id): Path<DbId>,
    Json(input): Json<CastVote>,
) -> AppResult<Json<DataResponse<VoteResult>>> {
    validate_vote(&input)?;

    let (vote, aggregates) =
        VoteRepo::cast_vote(&state.pool, note_id, user.user_id, input.value, input.rating)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "Note",
                id: note_id,
            }))?;

    Ok(Json(DataResponse {
        data: VoteResult { vote, aggregates },
    }))
}

/// DELETE /api/v1/notes/{id}/vote
///
/// Withdraw the caller's vote and recompute the note's aggregates.
pub async fn remove_vote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(note_id): Path<DbId>,
) -> AppResult<Json<DataResponse<VoteAggregates>>> {
    match VoteRepo::remove_vote(&state.pool, note_id, user.user_id).await? {
        RemoveVoteOutcome::NoteMissing => Err(AppError::Core(CoreError::NotFound {
            entity: "Note",
            id: note_id,
        })),
        RemoveVoteOutcome::VoteMissing => Err(AppError::Core(CoreError::NotFound {
            entity: "Vote",
            id: note_id,
        })),
        RemoveVoteOutcome::Removed(aggregates) => {
            Ok(Json(DataResponse { data: aggregates }))
        }
    }
}

/// GET /api/v1/notes/{id}/vote
///
/// The caller's own vote on this note, or 204 if they have none.
pub async fn get_own_vote(
    State(state): State<AppState>,
    user: AuthUser,
    Path(note_id): Path<DbId>,
) -> AppResult<axum::response::Response> {
    use axum::response::IntoResponse;

    match VoteRepo::find_user_vote(&state.pool, note_id, user.user_id).await? {
        Some(vote) => Ok(Json(DataResponse { data: vote }).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

/// Validate a vote payload: value in -1..=1, rating (if given) in 1..=5.
fn validate_vote(input: &CastVote) -> Result<(), AppError> {
    if !(-1..=1).contains(&input.value) {
        return Err(AppError::Core(CoreError::Validation(
            "Vote value must be -1, 0, or 1".to_string(),
        )));
    }
    if let Some(rating) = input.rating {
        if !(1..=5).contains(&rating) {
            return Err(AppError::Core(CoreError::Validation(
                "Rating must be between 1 and 5".to_string(),
            )));
        }
    }
    Ok(())
}
