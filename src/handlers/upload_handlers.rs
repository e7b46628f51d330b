//! HTTP handlers for media uploads and deletion.
//! Bodies are read fully into memory; size is capped by the router's body
//! limit rather than by streaming.

use crate::{
    errors::AppError,
    models::asset::AssetPayload,
    services::upload_service::UploadError,
    state::AppState,
};
use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{Field, MultipartRejection},
        rejection::JsonRejection,
    },
    http::StatusCode,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Folder used by `POST /api/upload` when the form omits one.
pub const DEFAULT_UPLOAD_FOLDER: &str = "videos";
/// Folder used by `POST /api/upload/images` when the form omits one.
pub const DEFAULT_IMAGE_FOLDER: &str = "properties";

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRequest {
    pub url: String,
}

/// `POST /api/upload`: store one file (`file`, optional `folder`).
pub async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let form = UploadForm::read(multipart?, &["file"], 1).await?;
    let folder = form.folder_or(DEFAULT_UPLOAD_FOLDER);
    let file = form
        .files
        .into_iter()
        .next()
        .ok_or(UploadError::MissingFile)?;

    let stored = state.uploads.upload(file.into_payload(folder)).await?;
    Ok(Json(UploadResponse { url: stored.url }))
}

/// `POST /api/upload/images`: store every `files` part, URLs in form order.
pub async fn upload_images(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<BatchUploadResponse>, AppError> {
    let form = UploadForm::read(multipart?, &["files", "files[]", "file"], usize::MAX).await?;
    let folder = form.folder_or(DEFAULT_IMAGE_FOLDER);
    let payloads = form
        .files
        .into_iter()
        .map(|file| file.into_payload(folder.clone()))
        .collect();

    let urls = state.uploads.upload_many(payloads).await?;
    Ok(Json(BatchUploadResponse { urls }))
}

/// `DELETE /api/upload`: remove the object behind a previously returned URL.
pub async fn delete_file(
    State(state): State<AppState>,
    req: Result<Json<DeleteRequest>, JsonRejection>,
) -> Result<StatusCode, AppError> {
    let Json(req) = req?;
    state.uploads.delete_by_url(&req.url).await?;
    Ok(StatusCode::NO_CONTENT)
}

struct FilePart {
    file_name: String,
    content_type: String,
    data: Bytes,
}

impl FilePart {
    fn into_payload(self, folder: String) -> AssetPayload {
        AssetPayload::new(self.data, self.content_type, self.file_name, folder)
    }
}

#[derive(Default)]
struct UploadForm {
    files: Vec<FilePart>,
    folder: Option<String>,
}

impl UploadForm {
    /// Collect up to `max_files` file parts named in `file_fields` plus the
    /// `folder` text field. Unknown fields and file parts past the limit are
    /// skipped unread; empty file inputs count as absent.
    async fn read(
        mut multipart: Multipart,
        file_fields: &[&str],
        max_files: usize,
    ) -> Result<Self, AppError> {
        let mut form = UploadForm::default();
        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            if name == "folder" {
                let folder = field.text().await?;
                form.folder = Some(folder);
            } else if file_fields.contains(&name.as_str()) && form.files.len() < max_files {
                if let Some(part) = read_file(field).await? {
                    form.files.push(part);
                }
            }
        }
        Ok(form)
    }

    fn folder_or(&self, default: &str) -> String {
        match self.folder.as_deref().map(str::trim) {
            Some(folder) if !folder.trim_matches('/').is_empty() => folder.to_string(),
            _ => default.to_string(),
        }
    }
}

async fn read_file(field: Field<'_>) -> Result<Option<FilePart>, AppError> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field
        .content_type()
        .filter(|ct| !ct.is_empty())
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string();
    let data = field.bytes().await?;

    if file_name.is_empty() && data.is_empty() {
        return Ok(None);
    }
    Ok(Some(FilePart {
        file_name,
        content_type,
        data,
    }))
}
