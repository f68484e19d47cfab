//! SHA-256 content addressing.
//!
//! The hex digest returned here is the integrity/dedup anchor for stored
//! objects: it identifies the bytes themselves, independent of the storage
//! key they happen to live under.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex digest of the given bytes.
pub fn sha256_hex(data: &[u8]) -> String {
    let digest = Sha256::digest(data);
    format!("{digest:x}")
}
