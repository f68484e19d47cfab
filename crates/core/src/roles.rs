//! Role name constants shared by the auth extractors and seed data.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_STUDENT: &str = "student";
