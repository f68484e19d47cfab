//! Course-session models.
//!
//! The course catalog is an external collaborator; the core only needs an
//! existence check for the foreign-key relation.

use moondance_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `course_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CourseSession {
    pub id: DbId,
    pub course_code: String,
    pub term_label: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub deleted_at: Option<Timestamp>,
}
