//! Pure domain logic for the note-sharing platform.
//!
//! This crate has no internal dependencies and no I/O. It holds the shared
//! error taxonomy, upload validation rules, the content extractor, and the
//! SHA-256 content-addressing helper used by the storage gateway.

pub mod error;
pub mod extract;
pub mod hashing;
pub mod roles;
pub mod types;
pub mod upload;
