//! Defines routes for media ingestion and the photo-service integration.
//!
//! ## Structure
//! - **Uploads**
//!   - `POST   /api/upload`       : single file (`file`, optional `folder`)
//!   - `POST   /api/upload/images`: batch images (`files`, optional `folder`)
//!   - `DELETE /api/upload`       : delete by previously returned URL
//!
//! - **Photo service**
//!   - `GET /api/auth/status`
//!   - `GET /api/photos/users/{user}/albums`
//!   - `GET /api/photos/albums/{album}/images`
//!   - `GET /api/photos/largest?uri=...`

use crate::{
    handlers::{
        auth_handlers::auth_status,
        health_handlers::{healthz, readyz},
        photo_handlers::{largest_image, list_album_images, list_albums},
        upload_handlers::{delete_file, upload_file, upload_images},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

/// Build and return the router for all API routes.
///
/// Upload routes accept bodies up to `max_upload_bytes`; everything else
/// keeps axum's default limit.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    let uploads = Router::new()
        .route("/api/upload", post(upload_file).delete(delete_file))
        .route("/api/upload/images", post(upload_images))
        .layer(DefaultBodyLimit::max(max_upload_bytes));

    Router::new()
        // health endpoints (mounted at root)
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .merge(uploads)
        .route("/api/auth/status", get(auth_status))
        .route("/api/photos/users/{user}/albums", get(list_albums))
        .route("/api/photos/albums/{album}/images", get(list_album_images))
        .route("/api/photos/largest", get(largest_image))
}
