//! Moderation report models and DTOs.

use moondance_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::models::lookup::LookupId;

/// A row from the `reports` table. One per (note, reporter).
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Report {
    pub id: DbId,
    pub note_id: DbId,
    pub reporter_id: DbId,
    pub reason: String,
    pub description: Option<String>,
    pub status_id: LookupId,
    pub moderator_notes: Option<String>,
    pub reviewed_by: Option<DbId>,
    pub reviewed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Request payload for reporting a note.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReport {
    pub reason: String,
    pub description: Option<String>,
}

/// Request payload for reviewing a report.
#[derive(Debug, Clone, Deserialize)]
pub struct ReviewReport {
    /// Target status: reviewed, resolved, or dismissed.
    pub status_id: LookupId,
    pub moderator_notes: Option<String>,
}
