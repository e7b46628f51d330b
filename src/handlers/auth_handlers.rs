//! Authorization-check endpoint for the photo-service integration.

use crate::{errors::AppError, models::access_token::AuthStatus, state::AppState};
use axum::{Json, extract::State};

/// `GET /api/auth/status`: whether an access token has been recorded.
pub async fn auth_status(State(state): State<AppState>) -> Result<Json<AuthStatus>, AppError> {
    Ok(Json(state.tokens.status().await?))
}
