//! Vote entity models and DTOs.

use moondance_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `votes` table. At most one per (note, user).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Vote {
    pub id: DbId,
    pub note_id: DbId,
    pub user_id: DbId,
    /// Signed direction: -1, 0, or 1.
    pub value: i32,
    /// Optional 1-5 rating.
    pub rating: Option<i32>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request payload for casting or replacing a vote.
#[derive(Debug, Clone, Deserialize)]
pub struct CastVote {
    pub value: i32,
    pub rating: Option<i32>,
}

/// Aggregates recomputed from the full vote set of one note.
#[derive(Debug, Clone, Copy, PartialEq, FromRow, Serialize)]
pub struct VoteAggregates {
    /// Positive votes minus negative votes.
    pub vote_count: i32,
    /// Mean of non-null ratings; 0.0 when none exist.
    pub average_rating: f64,
}
