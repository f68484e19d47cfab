//! S3-backed [`ObjectStore`] implementation.

use std::time::Duration;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::error::StorageError;
use crate::{describe, generate_key, ObjectStore, StoredObject};

/// Folder prefix for note payloads inside the bucket.
const NOTES_FOLDER: &str = "notes";

/// S3 connection settings, loaded from the environment by the API config.
#[derive(Debug, Clone)]
pub struct S3Config {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint (MinIO, localstack). `None` for real AWS.
    pub endpoint_url: Option<String>,
    /// Path-style addressing, required by most S3-compatible endpoints.
    pub force_path_style: bool,
}

/// Object store gateway backed by an S3 bucket.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
}

impl S3ObjectStore {
    /// Build a client from shared AWS config plus the given overrides.
    pub async fn connect(config: S3Config) -> Self {
        let base = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .load()
            .await;

        let mut builder = aws_sdk_s3::config::Builder::from(&base);
        if let Some(endpoint) = &config.endpoint_url {
            builder = builder
                .endpoint_url(endpoint)
                .force_path_style(config.force_path_style);
        }

        Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket,
        }
    }

    fn unavailable(context: &str, err: impl std::fmt::Display) -> StorageError {
        StorageError::Unavailable(format!("{context}: {err}"))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        bytes: Bytes,
        content_type: &str,
        original_name: &str,
    ) -> Result<StoredObject, StorageError> {
        let key = generate_key(NOTES_FOLDER, original_name);
        let stored = describe(&bytes, &key, content_type);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| Self::unavailable("put_object", e))?;

        tracing::info!(key = %stored.key, size = stored.size, "Object stored");
        Ok(stored)
    }

    async fn get(&self, key: &str) -> Result<Bytes, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    StorageError::Missing(key.to_string())
                } else {
                    Self::unavailable("get_object", service_err)
                }
            })?;

        let data = output
            .body
            .collect()
            .await
            .map_err(|e| Self::unavailable("get_object body", e))?;
        Ok(data.into_bytes())
    }

    async fn presign_get(&self, key: &str, ttl: Duration) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Self::unavailable("presigning config", e))?;

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Self::unavailable("presign get_object", e))?;

        Ok(request.uri().to_string())
    }

    async fn presign_download(
        &self,
        key: &str,
        filename: &str,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Self::unavailable("presigning config", e))?;

        // Quotes stripped from the filename so the header stays well-formed.
        let safe_name: String = filename.chars().filter(|c| *c != '"').collect();

        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .response_content_disposition(format!("attachment; filename=\"{safe_name}\""))
            .presigned(presigning)
            .await
            .map_err(|e| Self::unavailable("presign get_object", e))?;

        Ok(request.uri().to_string())
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        // S3's delete succeeds silently on unknown keys; check first so the
        // caller can distinguish Missing from success.
        if !self.exists(key).await? {
            return Err(StorageError::Missing(key.to_string()));
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Self::unavailable("delete_object", e))?;

        tracing::info!(key = %key, "Object deleted");
        Ok(())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(Self::unavailable("head_object", service_err))
                }
            }
        }
    }
}
