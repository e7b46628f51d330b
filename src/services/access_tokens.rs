//! AccessTokenStore: SQLite-backed record of photo-service access tokens.
//!
//! The ingestion core only ever asks whether a token exists; the photo
//! handlers additionally read the latest token to authenticate upstream calls.

use crate::models::access_token::{AccessToken, AuthStatus};
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AccessTokenStore {
    pub db: Arc<SqlitePool>,
}

impl AccessTokenStore {
    pub fn new(db: Arc<SqlitePool>) -> Self {
        Self { db }
    }

    /// Most recently created token, if any.
    pub async fn latest(&self) -> Result<Option<AccessToken>, sqlx::Error> {
        sqlx::query_as::<_, AccessToken>(
            "SELECT id, provider, token, token_secret, created_at
             FROM access_tokens
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .fetch_optional(&*self.db)
        .await
    }

    /// Presence of a token and when it was issued.
    pub async fn status(&self) -> Result<AuthStatus, sqlx::Error> {
        Ok(self.latest().await?.into())
    }

    pub async fn record(&self, token: &AccessToken) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO access_tokens (id, provider, token, token_secret, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(token.id)
        .bind(&token.provider)
        .bind(&token.token)
        .bind(&token.token_secret)
        .bind(token.created_at)
        .execute(&*self.db)
        .await?;
        Ok(())
    }
}
