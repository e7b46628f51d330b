//! Photo-service access tokens recorded after the provider's authorization flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A stored access token for the third-party photo service.
#[derive(Clone, FromRow, Debug)]
pub struct AccessToken {
    pub id: Uuid,

    /// Provider name (e.g. "smugmug").
    pub provider: String,

    pub token: String,

    /// OAuth 1 style secret, when the provider issues one.
    pub token_secret: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl AccessToken {
    /// New token record stamped with the current time.
    pub fn new(
        provider: impl Into<String>,
        token: impl Into<String>,
        token_secret: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            provider: provider.into(),
            token: token.into(),
            token_secret,
            created_at: Utc::now(),
        }
    }
}

/// Presence signal exposed to the authorization-check endpoint.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AuthStatus {
    pub authorized: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl From<Option<AccessToken>> for AuthStatus {
    fn from(token: Option<AccessToken>) -> Self {
        Self {
            authorized: token.is_some(),
            created_at: token.map(|t| t.created_at),
        }
    }
}
