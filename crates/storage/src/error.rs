use moondance_core::error::CoreError;

/// Failure modes of the object store gateway.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Transient I/O or backend failure. Safe to retry at the caller.
    #[error("Object store unavailable: {0}")]
    Unavailable(String),

    /// The key does not resolve to an object. Not retryable.
    #[error("Object not found: {0}")]
    Missing(String),
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Unavailable(msg) => CoreError::Unavailable(msg),
            StorageError::Missing(key) => CoreError::Internal(format!(
                "Stored object vanished: {key}"
            )),
        }
    }
}
