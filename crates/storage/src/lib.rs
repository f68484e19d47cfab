//! Object store gateway: durable, content-addressed binary storage.
//!
//! The [`ObjectStore`] trait is the only storage surface the rest of the
//! backend sees. Keys are generated server-side (never derived from user
//! input) and the SHA-256 content hash is computed once over the exact bytes
//! stored, so integrity and dedup checks are independent of where the object
//! lives. An object is atomic once `put` returns: readers never observe a
//! partial write.

mod error;
mod memory;
mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use moondance_core::hashing::sha256_hex;
use moondance_core::upload::file_extension;
use std::time::Duration;

pub use error::StorageError;
pub use memory::MemoryObjectStore;
pub use s3::{S3Config, S3ObjectStore};

/// Descriptor returned by a successful `put`.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Server-generated storage key. Immutable once assigned.
    pub key: String,
    /// SHA-256 hex digest of the stored bytes.
    pub content_hash: String,
    /// Exact byte size stored.
    pub size: i64,
    /// Media type recorded with the object.
    pub content_type: String,
}

/// Durable binary storage with time-limited access URLs.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `bytes` under a fresh generated key. Atomic: the object is
    /// either fully visible or absent.
    async fn put(
        &self,
        bytes: Bytes,
        content_type: &str,
        original_name: &str,
    ) -> Result<StoredObject, StorageError>;

    /// Fetch the full object. `StorageError::Missing` if the key is unknown.
    async fn get(&self, key: &str) -> Result<Bytes, StorageError>;

    /// Time-limited URL for inline viewing.
    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError>;

    /// Time-limited URL that downloads as an attachment with the given
    /// filename.
    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        ttl: Duration,
    ) -> Result<String, StorageError>;

    /// Remove the object. `StorageError::Missing` if the key is unknown.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// True if the key currently resolves to an object.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;
}

/// Generate a fresh storage key under `folder`, keeping the original
/// extension for readability. The UUID makes collisions and path traversal
/// structurally impossible.
pub(crate) fn generate_key(folder: &str, original_name: &str) -> String {
    let ext = file_extension(original_name);
    format!("{folder}/{}{ext}", uuid::Uuid::new_v4())
}

/// Compute the content descriptor for bytes about to be stored.
pub(crate) fn describe(bytes: &Bytes, key: &str, content_type: &str) -> StoredObject {
    StoredObject {
        key: key.to_string(),
        content_hash: sha256_hex(bytes),
        size: bytes.len() as i64,
        content_type: content_type.to_string(),
    }
}
