//! In-memory [`ObjectStore`] for tests and local development.
//!
//! Same contract as the S3 gateway: generated keys, content hashes over the
//! exact stored bytes, `Missing` on unknown keys. "Presigned" URLs use a
//! `memory://` scheme and carry the TTL, which is enough for callers that
//! only assert on URL shape.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StorageError;
use crate::{describe, generate_key, ObjectStore, StoredObject};

#[derive(Default)]
pub struct MemoryObjectStore {
    objects: Mutex<HashMap<String, Bytes>>,
    /// When set, every call fails with `Unavailable`. Lets tests exercise
    /// the transient-failure paths.
    unavailable: Mutex<bool>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle simulated backend outage.
    pub fn set_unavailable(&self, broken: bool) {
        *self.unavailable.lock().unwrap() = broken;
    }

    /// Number of stored objects. Test helper.
    pub fn len(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if *self.unavailable.lock().unwrap() {
            return Err(StorageError::Unavailable(
                "simulated object store outage".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        bytes: Bytes,
        content_type: &str,
        original_name: &str,
    ) -> Result<StoredObject, StorageError> {
        self.check_available()?;
        let key = generate_key("notes", original_name);
        let stored = describe(&bytes, &key, content_type);
        self.objects.lock().unwrap().insert(key, bytes);
        Ok(stored)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        self.check_available()?;
        self.objects
            .lock()
            .unwrap()
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::Missing(key.to_string()))
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        self.check_available()?;
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(StorageError::Missing(key.to_string()));
        }
        Ok(format!("memory://{key}?expires={}", ttl.as_secs()))
    }

    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        self.check_available()?;
        if !self.objects.lock().unwrap().contains_key(key) {
            return Err(StorageError::Missing(key.to_string()));
        }
        Ok(format!(
            "memory://{key}?expires={}&attachment={filename}",
            ttl.as_secs()
        ))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.check_available()?;
        self.objects
            .lock()
            .unwrap()
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| StorageError::Missing(key.to_string()))
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        self.check_available()?;
        Ok(self.objects.lock().unwrap().contains_key(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = MemoryObjectStore::new();
        let stored = store
            .put(Bytes::from_static(b"%PDF-1.4 fixture"), "application/pdf", "week1.pdf")
            .await
            .unwrap();

        assert!(stored.key.starts_with("notes/"));
        assert_eq!(stored.size, 16);

        let bytes = store.get(&stored.key).await.unwrap();
        assert_eq!(&bytes[..], b"%PDF-1.4 fixture");
    }

    #[tokio::test]
    async fn unknown_key_is_missing() {
        let store = MemoryObjectStore::new();
        assert_matches!(
            store.get("notes/nope.pdf").await,
            Err(StorageError::Missing(_))
        );
        assert_matches!(
            store.delete("notes/nope.pdf").await,
            Err(StorageError::Missing(_))
        );
        assert!(!store.exists("notes/nope.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn outage_maps_to_unavailable() {
        let store = MemoryObjectStore::new();
        store.set_unavailable(true);
        assert_matches!(
            store
                .put(Bytes::from_static(b"x"), "application/pdf", "a.pdf")
                .await,
            Err(StorageError::Unavailable(_))
        );
    }

    #[tokio::test]
    async fn presigned_urls_carry_ttl() {
        let store = MemoryObjectStore::new();
        let stored = store
            .put(Bytes::from_static(b"x"), "application/pdf", "a.pdf")
            .await
            .unwrap();

        let url = store
            .presign_get(&stored.key, Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.contains("expires=600"));

        let url = store
            .presign_download(&stored.key, "a.pdf", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(url.contains("attachment=a.pdf"));
    }
}
