//! Object key generation.
//!
//! Keys are built locally from randomness (and optionally the clock), with no
//! shared counter, so concurrent uploads never need to coordinate.

use crate::models::asset::{ObjectKey, is_key_segment};
use chrono::Utc;
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

/// How the unique token part of a key is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyStrategy {
    /// 32 hex chars of a v4 UUID (122 random bits).
    #[default]
    Random,
    /// `<unix-millis>-<v4 uuid>`; sorts by upload time within a folder.
    Timestamped,
}

#[derive(Debug, Error)]
#[error("unknown key strategy `{0}` (expected `random` or `timestamped`)")]
pub struct UnknownKeyStrategy(String);

/// Folder containing an empty, `.`/`..`, or non `[A-Za-z0-9._-]` segment.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("folder `{0}` may only contain letters, digits, `-`, `_` and `.` between slashes")]
pub struct InvalidFolder(pub String);

impl FromStr for KeyStrategy {
    type Err = UnknownKeyStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "random" | "uuid" => Ok(KeyStrategy::Random),
            "timestamped" | "timestamp" => Ok(KeyStrategy::Timestamped),
            other => Err(UnknownKeyStrategy(other.to_string())),
        }
    }
}

impl fmt::Display for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStrategy::Random => f.write_str("random"),
            KeyStrategy::Timestamped => f.write_str("timestamped"),
        }
    }
}

/// Stateless generator of collision-resistant object names.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityGenerator {
    strategy: KeyStrategy,
}

impl IdentityGenerator {
    pub fn new(strategy: KeyStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> KeyStrategy {
        self.strategy
    }

    /// Produce `<token>.<ext>` for `original_name`. Never fails.
    ///
    /// The extension is whatever follows the last `.` when it is plain ASCII
    /// alphanumeric; other names yield a bare token.
    pub fn generate(&self, original_name: &str) -> String {
        let token = self.token();
        match extension(original_name) {
            Some(ext) => format!("{}.{}", token, ext),
            None => token,
        }
    }

    /// Full object key `<folder>/<token>.<ext>`.
    ///
    /// `folder` is trimmed of whitespace and surrounding slashes; an empty
    /// folder produces a key at the bucket root. Anything else must pass
    /// [`normalize_folder`] or no key is generated.
    pub fn object_key(&self, folder: &str, original_name: &str) -> Result<ObjectKey, InvalidFolder> {
        let folder = normalize_folder(folder)?;
        let name = self.generate(original_name);
        if folder.is_empty() {
            Ok(ObjectKey::new(name))
        } else {
            Ok(ObjectKey::new(format!("{}/{}", folder, name)))
        }
    }

    fn token(&self) -> String {
        let random = Uuid::new_v4().simple().to_string();
        match self.strategy {
            KeyStrategy::Random => random,
            KeyStrategy::Timestamped => {
                format!("{}-{}", Utc::now().timestamp_millis(), random)
            }
        }
    }
}

/// Trim `folder` and check each of its segments.
pub fn normalize_folder(folder: &str) -> Result<&str, InvalidFolder> {
    let trimmed = folder.trim().trim_matches('/');
    if trimmed.is_empty() || trimmed.split('/').all(is_key_segment) {
        Ok(trimmed)
    } else {
        Err(InvalidFolder(folder.to_string()))
    }
}

/// Substring after the last `.` in the final path segment, if it is non-empty
/// ASCII alphanumeric.
fn extension(original_name: &str) -> Option<&str> {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(original_name);
    match base.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()) => {
            Some(ext)
        }
        _ => None,
    }
}
