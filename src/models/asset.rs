//! Transient values flowing through an upload.

use bytes::Bytes;
use serde::Serialize;
use std::{fmt, str::FromStr};

/// One client-submitted file, alive only for the duration of an upload call.
#[derive(Debug, Clone)]
pub struct AssetPayload {
    /// Raw file content.
    pub data: Bytes,

    /// Declared MIME type; stored on the object so browsers render it.
    pub content_type: String,

    /// Original file name. Only its extension survives into the key.
    pub file_name: String,

    /// Logical folder the object is namespaced under.
    pub folder: String,
}

impl AssetPayload {
    pub fn new(
        data: impl Into<Bytes>,
        content_type: impl Into<String>,
        file_name: impl Into<String>,
        folder: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
            file_name: file_name.into(),
            folder: folder.into(),
        }
    }
}

/// Path-like identifier of a stored object: `<folder>/<token>.<ext>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ObjectKey(String);

impl ObjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Accept `key` only if every `/`-separated segment is a valid key segment.
    pub fn parse(key: &str) -> Option<Self> {
        key.split('/')
            .all(is_key_segment)
            .then(|| Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Non-empty, not `.` or `..`, and limited to `[A-Za-z0-9._-]`.
///
/// Keys built from such segments are stored verbatim by S3 and by
/// `object_store` paths and appear unescaped in URLs, so the written key, the
/// resolved URL and the key parsed back from that URL are the same string.
pub fn is_key_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Access-control attribute applied to written objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Visibility {
    /// Retrievable by an unauthenticated GET.
    #[default]
    PublicRead,
    Private,
}

impl FromStr for Visibility {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public-read" | "public" => Ok(Visibility::PublicRead),
            "private" => Ok(Visibility::Private),
            other => Err(format!(
                "unknown visibility `{other}` (expected `public-read` or `private`)"
            )),
        }
    }
}

/// Result of a successful single upload.
#[derive(Debug, Clone, Serialize)]
pub struct StoredAsset {
    pub key: ObjectKey,
    pub url: String,
}
