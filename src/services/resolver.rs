//! Mapping between object keys and public URLs.
//!
//! [`UrlResolver::resolve`] and [`UrlResolver::key_from_url`] are a matched
//! pair: every URL produced by `resolve` inverts back to its key.

use crate::{config::StorageConfig, models::asset::ObjectKey};
use percent_encoding::percent_decode_str;
use url::Url;

/// Builds public URLs from object keys, preferring the CDN when configured.
#[derive(Debug, Clone)]
pub struct UrlResolver {
    /// Everything before `/<key>`; never ends with a slash.
    base: String,
}

impl UrlResolver {
    /// Derive the URL base from storage configuration.
    ///
    /// - CDN configured: `<cdn>/<key>`
    /// - custom endpoint: path-style `<endpoint>/<bucket>/<key>`
    /// - otherwise AWS virtual-hosted style
    ///   `https://<bucket>.s3.<region>.amazonaws.com/<key>`
    pub fn new(config: &StorageConfig) -> Self {
        let base = if let Some(cdn) = &config.cdn_base_url {
            cdn.trim_end_matches('/').to_string()
        } else if let Some(endpoint) = &config.endpoint {
            format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket)
        } else {
            format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region)
        };
        Self { base }
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Public URL for `key`. Pure; cannot fail.
    pub fn resolve(&self, key: &ObjectKey) -> String {
        format!("{}/{}", self.base, key)
    }

    /// Recover the object key from a URL.
    ///
    /// URLs produced by [`resolve`](Self::resolve) invert exactly. Any other
    /// absolute URL falls back to its path minus the leading slash, which is
    /// only meaningful if that URL addressed this bucket. Returns `None` unless
    /// the extracted key has the shape of a key this service generates (see
    /// [`ObjectKey::parse`]).
    pub fn key_from_url(&self, url: &str) -> Option<ObjectKey> {
        let url = url.trim();
        if let Some(rest) = url.strip_prefix(self.base.as_str()) {
            if let Some(key) = rest.strip_prefix('/') {
                return ObjectKey::parse(strip_query(key));
            }
        }

        let parsed = Url::parse(url).ok()?;
        let path = parsed.path().trim_start_matches('/');
        let key = percent_decode_str(path).decode_utf8().ok()?;
        ObjectKey::parse(&key)
    }
}

fn strip_query(s: &str) -> &str {
    s.split(['?', '#']).next().unwrap_or(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::{IdentityGenerator, KeyStrategy};

    fn key() -> ObjectKey {
        ObjectKey::new("properties/0f8c2d7e5b9a4c1d8e3f6a2b7c9d0e1f.jpg")
    }

    #[test]
    fn direct_s3_url_uses_virtual_hosted_style() {
        let resolver = UrlResolver::new(&StorageConfig::new("listings", "eu-west-1"));
        assert_eq!(
            resolver.resolve(&key()),
            "https://listings.s3.eu-west-1.amazonaws.com/properties/0f8c2d7e5b9a4c1d8e3f6a2b7c9d0e1f.jpg"
        );
    }

    #[test]
    fn cdn_takes_precedence_over_bucket_host() {
        let resolver = UrlResolver::new(
            &StorageConfig::new("listings", "eu-west-1")
                .with_endpoint("http://localhost:9000")
                .with_cdn("https://cdn.example.com/"),
        );
        assert_eq!(
            resolver.resolve(&key()),
            format!("https://cdn.example.com/{}", key())
        );
    }

    #[test]
    fn cdn_and_direct_urls_differ_but_both_invert() {
        let direct = UrlResolver::new(&StorageConfig::new("listings", "us-east-1"));
        let cdn = UrlResolver::new(
            &StorageConfig::new("listings", "us-east-1").with_cdn("https://d111.cloudfront.net"),
        );
        let a = direct.resolve(&key());
        let b = cdn.resolve(&key());
        assert_ne!(a, b);
        assert_eq!(direct.key_from_url(&a), Some(key()));
        assert_eq!(cdn.key_from_url(&b), Some(key()));
    }

    #[test]
    fn path_style_endpoint_inverts_without_bucket_segment() {
        let resolver = UrlResolver::new(
            &StorageConfig::new("listings", "us-east-1").with_endpoint("http://localhost:9000/"),
        );
        let url = resolver.resolve(&key());
        assert_eq!(url, format!("http://localhost:9000/listings/{}", key()));
        assert_eq!(resolver.key_from_url(&url), Some(key()));
    }

    #[test]
    fn cdn_base_with_path_prefix_inverts() {
        let resolver = UrlResolver::new(
            &StorageConfig::new("listings", "us-east-1").with_cdn("https://example.com/media"),
        );
        let url = resolver.resolve(&key());
        assert_eq!(resolver.key_from_url(&url), Some(key()));
    }

    #[test]
    fn foreign_url_falls_back_to_path() {
        let resolver = UrlResolver::new(&StorageConfig::new("listings", "us-east-1"));
        assert_eq!(
            resolver.key_from_url("https://elsewhere.example.org/videos/tour_1.mp4?x=1"),
            Some(ObjectKey::new("videos/tour_1.mp4"))
        );
        assert_eq!(
            resolver.key_from_url("https://elsewhere.example.org/videos/a%20b.mp4"),
            None
        );
    }

    #[test]
    fn every_generated_key_inverts_under_every_base() {
        let ids = IdentityGenerator::new(KeyStrategy::Timestamped);
        let resolvers = [
            UrlResolver::new(&StorageConfig::new("listings", "us-east-1")),
            UrlResolver::new(
                &StorageConfig::new("listings", "us-east-1").with_endpoint("http://localhost:9000"),
            ),
            UrlResolver::new(
                &StorageConfig::new("listings", "us-east-1").with_cdn("https://cdn.example.com/media/"),
            ),
        ];
        for folder in ["properties", "listings/2024_summer", "v1.2-final", ""] {
            for name in ["front.JPG", "no-extension", "archive.tar.gz"] {
                let key = ids.object_key(folder, name).unwrap();
                for resolver in &resolvers {
                    let url = resolver.resolve(&key);
                    assert!(Url::parse(&url).is_ok(), "{url}");
                    assert_eq!(resolver.key_from_url(&url), Some(key.clone()), "{url}");
                }
            }
        }
    }

    #[test]
    fn keys_no_upload_could_produce_are_refused() {
        let resolver = UrlResolver::new(&StorageConfig::new("listings", "us-east-1"));
        let base = resolver.base().to_string();
        for tail in ["a//b/x.png", "../up/x.png", "%5Bdraft%5D/x.png", "dir/"] {
            assert_eq!(resolver.key_from_url(&format!("{base}/{tail}")), None, "{tail}");
        }
    }

    #[test]
    fn unusable_urls_yield_none() {
        let resolver = UrlResolver::new(&StorageConfig::new("listings", "us-east-1"));
        assert_eq!(resolver.key_from_url("not a url"), None);
        assert_eq!(resolver.key_from_url("https://example.org/"), None);
        assert_eq!(
            resolver.key_from_url("https://listings.s3.us-east-1.amazonaws.com/"),
            None
        );
    }
}
