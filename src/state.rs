//! Shared handler state, built once at startup from `AppConfig`.

use crate::{
    config::AppConfig,
    services::{
        access_tokens::AccessTokenStore,
        blob_store::BlobStore,
        identity::IdentityGenerator,
        photo_client::{PhotoClient, PhotoServiceError},
        resolver::UrlResolver,
        upload_service::UploadService,
    },
};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub uploads: UploadService,
    pub tokens: AccessTokenStore,
    pub photos: PhotoClient,
}

impl AppState {
    /// Wire services from configuration around an already-built blob store.
    pub fn new(
        cfg: &AppConfig,
        store: Arc<dyn BlobStore>,
        db: Arc<SqlitePool>,
    ) -> Result<Self, PhotoServiceError> {
        let uploads = UploadService::new(
            store,
            IdentityGenerator::new(cfg.key_strategy),
            UrlResolver::new(&cfg.storage),
        );
        Ok(Self {
            uploads,
            tokens: AccessTokenStore::new(db),
            photos: PhotoClient::new(&cfg.photos)?,
        })
    }
}
