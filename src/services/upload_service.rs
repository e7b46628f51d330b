//! UploadService: names, stores and links client-submitted media.
//!
//! Single uploads, ordered batch uploads, and deletion by URL. Objects from a
//! failed batch that already reached the store are left in place.

use crate::{
    models::asset::{AssetPayload, ObjectKey, StoredAsset},
    services::{
        blob_store::{BlobStore, StorageError},
        identity::{IdentityGenerator, InvalidFolder},
        resolver::UrlResolver,
    },
};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{JoinError, JoinSet};
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("no file provided")]
    MissingFile,
    #[error("`{0}` does not address a stored object")]
    InvalidUrl(String),
    #[error(transparent)]
    InvalidFolder(#[from] InvalidFolder),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("upload task did not complete")]
    Interrupted(#[from] JoinError),
}

impl UploadError {
    /// Caller mistakes, detected before any storage I/O.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            UploadError::MissingFile | UploadError::InvalidUrl(_) | UploadError::InvalidFolder(_)
        )
    }
}

pub type UploadResult<T> = Result<T, UploadError>;

#[derive(Clone)]
pub struct UploadService {
    store: Arc<dyn BlobStore>,
    ids: IdentityGenerator,
    resolver: UrlResolver,
}

impl UploadService {
    pub fn new(store: Arc<dyn BlobStore>, ids: IdentityGenerator, resolver: UrlResolver) -> Self {
        Self {
            store,
            ids,
            resolver,
        }
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn resolver(&self) -> &UrlResolver {
        &self.resolver
    }

    /// Store one asset under a fresh key and return its key and public URL.
    pub async fn upload(&self, payload: AssetPayload) -> UploadResult<StoredAsset> {
        let key = self.ids.object_key(&payload.folder, &payload.file_name)?;
        self.store_at(key, payload).await
    }

    async fn store_at(&self, key: ObjectKey, payload: AssetPayload) -> UploadResult<StoredAsset> {
        debug!(
            key = %key,
            folder = %payload.folder,
            size_bytes = payload.data.len(),
            "storing asset"
        );

        self.store
            .put(&key, payload.data, &payload.content_type)
            .await?;

        let url = self.resolver.resolve(&key);
        Ok(StoredAsset { key, url })
    }

    /// Upload every payload concurrently; `result[i]` is the URL of `payloads[i]`.
    ///
    /// All-or-nothing: the first failure is returned once every in-flight
    /// sibling has finished. Nothing is rolled back.
    pub async fn upload_many(&self, payloads: Vec<AssetPayload>) -> UploadResult<Vec<String>> {
        if payloads.is_empty() {
            return Err(UploadError::MissingFile);
        }
        let keyed = payloads
            .into_iter()
            .map(|payload| -> UploadResult<(ObjectKey, AssetPayload)> {
                let key = self.ids.object_key(&payload.folder, &payload.file_name)?;
                Ok((key, payload))
            })
            .collect::<UploadResult<Vec<_>>>()?;

        let mut tasks = JoinSet::new();
        for (index, (key, payload)) in keyed.into_iter().enumerate() {
            let service = self.clone();
            tasks.spawn(async move { (index, service.store_at(key, payload).await) });
        }

        let mut urls: Vec<Option<String>> = vec![None; tasks.len()];
        let mut first_error = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(asset))) => urls[index] = Some(asset.url),
                Ok((_, Err(err))) => {
                    first_error.get_or_insert(err);
                }
                Err(err) => {
                    first_error.get_or_insert(UploadError::Interrupted(err));
                }
            }
        }

        if let Some(err) = first_error {
            return Err(err);
        }
        Ok(urls.into_iter().flatten().collect())
    }

    /// Delete the object addressed by a URL previously returned from an upload.
    pub async fn delete_by_url(&self, url: &str) -> UploadResult<ObjectKey> {
        let key = self
            .resolver
            .key_from_url(url)
            .ok_or_else(|| UploadError::InvalidUrl(url.to_string()))?;
        debug!(key = %key, "deleting asset");
        self.store.delete(&key).await?;
        Ok(key)
    }
}
