//! Core data models for the media ingestion service.
//!
//! Upload values are transient and never persisted by the service itself;
//! access tokens map to the SQLite `access_tokens` table via `sqlx::FromRow`.

pub mod access_token;
pub mod asset;
