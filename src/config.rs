use anyhow::{Context, Result, bail};
use clap::Parser;
use std::env;

use crate::models::asset::Visibility;
use crate::services::identity::KeyStrategy;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;
const DEFAULT_PHOTO_API_BASE: &str = "https://api.smugmug.com/api/v2";

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub max_upload_bytes: usize,
    pub key_strategy: KeyStrategy,
    pub storage: StorageConfig,
    pub photos: PhotoServiceConfig,
}

/// Blob-storage settings, resolved once at startup and never mutated.
#[derive(Clone)]
pub struct StorageConfig {
    pub region: String,
    pub bucket: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...).
    pub endpoint: Option<String>,
    /// Public URL prefix fronting the bucket.
    pub cdn_base_url: Option<String>,
    pub visibility: Visibility,
}

// Credentials stay out of the startup log.
impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "<redacted>"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("cdn_base_url", &self.cdn_base_url)
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl StorageConfig {
    /// Minimal config for a bucket without CDN, credentials or custom endpoint.
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            bucket: bucket.into(),
            access_key_id: None,
            secret_access_key: None,
            endpoint: None,
            cdn_base_url: None,
            visibility: Visibility::PublicRead,
        }
    }

    pub fn with_cdn(mut self, base: impl Into<String>) -> Self {
        self.cdn_base_url = Some(base.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct PhotoServiceConfig {
    pub api_base: String,
    pub api_key: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Listing media ingestion API")]
pub struct Args {
    /// Host to bind to (overrides MEDIA_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides MEDIA_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Database URL (overrides MEDIA_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket receiving uploads (overrides AWS_S3_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Public CDN prefix for resolved URLs (overrides CDN_BASE_URL)
    #[arg(long)]
    pub cdn_base_url: Option<String>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        let args = Args::parse();
        let migrate = args.migrate;
        let cfg = Self::resolve(args, |name| env::var(name).ok())?;
        Ok((cfg, migrate))
    }

    /// Merge CLI args over values returned by `lookup`, falling back to defaults.
    pub fn resolve(args: Args, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_port = match lookup("MEDIA_PORT") {
            Some(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing MEDIA_PORT value `{}`", value))?,
            None => 3000,
        };
        let max_upload_bytes = match lookup("MEDIA_MAX_UPLOAD_BYTES") {
            Some(value) => value
                .parse::<usize>()
                .with_context(|| format!("parsing MEDIA_MAX_UPLOAD_BYTES value `{}`", value))?,
            None => DEFAULT_MAX_UPLOAD_BYTES,
        };
        let key_strategy = match lookup("MEDIA_KEY_STRATEGY") {
            Some(value) => value
                .parse::<KeyStrategy>()
                .with_context(|| format!("parsing MEDIA_KEY_STRATEGY value `{}`", value))?,
            None => KeyStrategy::default(),
        };

        let visibility = match lookup("MEDIA_OBJECT_VISIBILITY") {
            Some(value) => value.parse::<Visibility>().map_err(anyhow::Error::msg)?,
            None => Visibility::PublicRead,
        };

        let bucket = match args.bucket.or_else(|| lookup("AWS_S3_BUCKET")) {
            Some(bucket) if !bucket.trim().is_empty() => bucket,
            _ => bail!("AWS_S3_BUCKET (or --bucket) must be set"),
        };

        let storage = StorageConfig {
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".into()),
            bucket,
            access_key_id: lookup("AWS_ACCESS_KEY_ID"),
            secret_access_key: lookup("AWS_SECRET_ACCESS_KEY"),
            endpoint: lookup("AWS_S3_ENDPOINT").filter(|v| !v.is_empty()),
            cdn_base_url: args
                .cdn_base_url
                .or_else(|| lookup("CDN_BASE_URL"))
                .filter(|v| !v.is_empty()),
            visibility,
        };

        let photos = PhotoServiceConfig {
            api_base: lookup("PHOTO_API_BASE").unwrap_or_else(|| DEFAULT_PHOTO_API_BASE.into()),
            api_key: lookup("PHOTO_API_KEY"),
        };

        Ok(Self {
            host: args
                .host
                .or_else(|| lookup("MEDIA_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args.port.unwrap_or(env_port),
            database_url: args
                .database_url
                .or_else(|| lookup("MEDIA_DATABASE_URL"))
                .unwrap_or_else(|| "sqlite://./data/media.db".into()),
            max_upload_bytes,
            key_strategy,
            storage,
            photos,
        })
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn fake_env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn defaults_apply_when_only_bucket_is_set() {
        let cfg = AppConfig::resolve(Args::default(), fake_env(&[("AWS_S3_BUCKET", "listings")]))
            .unwrap();
        assert_eq!(cfg.addr(), "0.0.0.0:3000");
        assert_eq!(cfg.storage.bucket, "listings");
        assert_eq!(cfg.storage.region, "us-east-1");
        assert!(cfg.storage.cdn_base_url.is_none());
        assert_eq!(cfg.key_strategy, KeyStrategy::Random);
        assert_eq!(cfg.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
    }

    #[test]
    fn cli_args_override_environment() {
        let args = Args {
            port: Some(8080),
            cdn_base_url: Some("https://cdn.example.com".into()),
            ..Args::default()
        };
        let cfg = AppConfig::resolve(
            args,
            fake_env(&[
                ("AWS_S3_BUCKET", "listings"),
                ("MEDIA_PORT", "9000"),
                ("CDN_BASE_URL", "https://other.example.com"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.storage.cdn_base_url.as_deref(), Some("https://cdn.example.com"));
    }

    #[test]
    fn visibility_can_be_made_private() {
        let cfg = AppConfig::resolve(
            Args::default(),
            fake_env(&[("AWS_S3_BUCKET", "b"), ("MEDIA_OBJECT_VISIBILITY", "private")]),
        )
        .unwrap();
        assert_eq!(cfg.storage.visibility, Visibility::Private);
    }

    #[test]
    fn missing_bucket_is_rejected() {
        let err = AppConfig::resolve(Args::default(), fake_env(&[])).unwrap_err();
        assert!(err.to_string().contains("AWS_S3_BUCKET"));
    }

    #[test]
    fn bad_port_names_the_variable() {
        let err = AppConfig::resolve(
            Args::default(),
            fake_env(&[("AWS_S3_BUCKET", "b"), ("MEDIA_PORT", "http")]),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("MEDIA_PORT"));
    }

    #[test]
    fn debug_output_redacts_credentials() {
        let mut storage = StorageConfig::new("b", "eu-west-1");
        storage.secret_access_key = Some("very-secret".into());
        let rendered = format!("{:?}", storage);
        assert!(!rendered.contains("very-secret"));
    }
}
