//! Blob-storage client.
//!
//! [`BlobStore`] is the seam the upload orchestrator talks to. Production
//! uses the AWS SDK backend in [`s3_store`](super::s3_store);
//! [`ObjectStoreBackend`] adapts any [`object_store`] implementation; tests
//! run it over an in-memory store.

use crate::models::asset::ObjectKey;
use async_trait::async_trait;
use bytes::Bytes;
use object_store::{
    Attribute, ObjectStore, PutOptions, PutPayload, memory::InMemory, path::Path,
};
use std::{sync::Arc, time::Instant};
use thiserror::Error;

/// Every failure of the storage backend: network, auth, quota, validation.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage backend failed to {op} `{key}`")]
    Backend {
        op: &'static str,
        key: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl StorageError {
    pub fn backend(
        op: &'static str,
        key: &ObjectKey,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        StorageError::Backend {
            op,
            key: key.to_string(),
            source: source.into(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Object read back from the store.
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: Option<String>,
}

/// Durable put/get/delete against a remote blob store.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Write `data` at `key` with the given content type.
    ///
    /// On success the object is durably readable at `key`.
    async fn put(&self, key: &ObjectKey, data: Bytes, content_type: &str) -> StorageResult<()>;

    async fn get(&self, key: &ObjectKey) -> StorageResult<StoredObject>;

    /// Remove `key`. Deleting a missing object succeeds.
    async fn delete(&self, key: &ObjectKey) -> StorageResult<()>;

    /// Cheap reachability probe used by readiness checks.
    async fn verify_reachable(&self) -> StorageResult<()>;
}

/// [`BlobStore`] backed by any [`ObjectStore`] implementation.
#[derive(Clone, Debug)]
pub struct ObjectStoreBackend {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl ObjectStoreBackend {
    /// Wrap an existing store; `bucket` is used for log fields only.
    pub fn new(store: impl ObjectStore, bucket: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            bucket: bucket.into(),
        }
    }

    /// Ephemeral in-memory store.
    pub fn in_memory() -> Self {
        Self::new(InMemory::new(), "memory")
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBackend {
    async fn put(&self, key: &ObjectKey, data: Bytes, content_type: &str) -> StorageResult<()> {
        let start = Instant::now();
        let size = data.len();
        let location = Path::from(key.as_str());
        let mut opts = PutOptions::default();
        opts.attributes
            .insert(Attribute::ContentType, content_type.to_string().into());

        self.store
            .put_opts(&location, PutPayload::from(data), opts)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "object upload failed"
                );
                StorageError::backend("write", key, e)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "object upload successful"
        );
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> StorageResult<StoredObject> {
        let location = Path::from(key.as_str());
        let result = self
            .store
            .get(&location)
            .await
            .map_err(|e| StorageError::backend("read", key, e))?;
        let content_type = result
            .attributes
            .get(&Attribute::ContentType)
            .map(|v| v.to_string());
        let data = result
            .bytes()
            .await
            .map_err(|e| StorageError::backend("read", key, e))?;
        Ok(StoredObject { data, content_type })
    }

    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        let start = Instant::now();
        let location = Path::from(key.as_str());

        match self.store.delete(&location).await {
            Ok(()) => {}
            Err(object_store::Error::NotFound { .. }) => {
                tracing::debug!(bucket = %self.bucket, key = %key, "object already absent");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "object delete failed"
                );
                return Err(StorageError::backend("delete", key, e));
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "object delete successful"
        );
        Ok(())
    }

    async fn verify_reachable(&self) -> StorageResult<()> {
        let probe = ObjectKey::new(".readyz-probe");
        match self.store.head(&Path::from(probe.as_str())).await {
            Ok(_) | Err(object_store::Error::NotFound { .. }) => Ok(()),
            Err(e) => Err(StorageError::backend("probe", &probe, e)),
        }
    }
}
