//! Proxy handlers for the third-party photo service.
//!
//! Every call authenticates with the most recently recorded access token.

use crate::{
    errors::AppError, services::photo_client::PhotoServiceError, state::AppState,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct LargestImageQuery {
    pub uri: String,
}

#[derive(Debug, Serialize)]
pub struct LargestImageResponse {
    pub url: String,
}

/// `GET /api/photos/users/{user}/albums`
pub async fn list_albums(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> Result<Json<Value>, AppError> {
    let token = current_token(&state).await?;
    Ok(Json(state.photos.list_albums(&token, &user).await?))
}

/// `GET /api/photos/albums/{album}/images`
pub async fn list_album_images(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Result<Json<Value>, AppError> {
    let token = current_token(&state).await?;
    Ok(Json(state.photos.list_album_images(&token, &album).await?))
}

/// `GET /api/photos/largest?uri=/api/v2/image/<id>`
pub async fn largest_image(
    State(state): State<AppState>,
    Query(q): Query<LargestImageQuery>,
) -> Result<Json<LargestImageResponse>, AppError> {
    if q.uri.trim().is_empty() {
        return Err(AppError::bad_request("Missing image uri"));
    }
    let token = current_token(&state).await?;
    let url = state.photos.largest_image_url(&token, &q.uri).await?;
    Ok(Json(LargestImageResponse { url }))
}

async fn current_token(state: &AppState) -> Result<String, AppError> {
    match state.tokens.latest().await? {
        Some(token) => Ok(token.token),
        None => Err(PhotoServiceError::NotAuthorized.into()),
    }
}
