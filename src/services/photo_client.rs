//! PhotoClient: authenticated pass-through to the third-party photo service.
//!
//! Each operation is a single GET against the configured API base. Responses
//! are returned in the provider's own JSON shape; no retry or pagination.

use crate::config::PhotoServiceConfig;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use thiserror::Error;
use url::Url;

/// Path-segment escaping; keeps the characters provider ids are made of.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

#[derive(Debug, Error)]
pub enum PhotoServiceError {
    #[error("photo service is not authorized")]
    NotAuthorized,
    #[error("invalid photo service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("photo service request failed")]
    Request(#[from] reqwest::Error),
    #[error("photo service answered {status} for {endpoint}")]
    Upstream { status: StatusCode, endpoint: String },
    #[error("photo service response is missing `{0}`")]
    MissingField(&'static str),
}

#[derive(Clone, Debug)]
pub struct PhotoClient {
    client: Client,
    base: Url,
    api_key: Option<String>,
}

impl PhotoClient {
    pub fn new(config: &PhotoServiceConfig) -> Result<Self, PhotoServiceError> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        // A trailing slash makes relative joins append instead of replace.
        let base = Url::parse(&format!("{}/", config.api_base.trim_end_matches('/')))?;
        Ok(Self {
            client,
            base,
            api_key: config.api_key.clone(),
        })
    }

    /// Albums owned by `user`.
    pub async fn list_albums(&self, token: &str, user: &str) -> Result<Value, PhotoServiceError> {
        let url = self
            .base
            .join(&format!("user/{}!albums", utf8_percent_encode(user, SEGMENT)))?;
        self.get_json(token, url).await
    }

    /// Images inside the album identified by `album_key`.
    pub async fn list_album_images(
        &self,
        token: &str,
        album_key: &str,
    ) -> Result<Value, PhotoServiceError> {
        let url = self
            .base
            .join(&format!("album/{}!images", utf8_percent_encode(album_key, SEGMENT)))?;
        self.get_json(token, url).await
    }

    /// Download URL of the largest rendition of the image at `image_uri`.
    ///
    /// `image_uri` is the host-absolute path the provider hands out
    /// (e.g. `/api/v2/image/abc-0`).
    pub async fn largest_image_url(
        &self,
        token: &str,
        image_uri: &str,
    ) -> Result<String, PhotoServiceError> {
        let url = self.base.join(&format!("{}!largestimage", image_uri.trim()))?;
        let body = self.get_json(token, url).await?;
        body.pointer("/Response/LargestImage/Url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(PhotoServiceError::MissingField("Response.LargestImage.Url"))
    }

    async fn get_json(&self, token: &str, mut url: Url) -> Result<Value, PhotoServiceError> {
        if let Some(key) = &self.api_key {
            url.query_pairs_mut().append_pair("APIKey", key);
        }
        let endpoint = url.path().to_string();
        tracing::debug!(endpoint = %endpoint, "photo service request");

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PhotoServiceError::Upstream { status, endpoint });
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(server: &mockito::Server, api_key: Option<&str>) -> PhotoClient {
        PhotoClient::new(&PhotoServiceConfig {
            api_base: format!("{}/api/v2", server.url()),
            api_key: api_key.map(str::to_string),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn list_albums_sends_credentials_and_returns_provider_json() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/user/jane!albums".into()))
            .match_header("authorization", "Bearer tok-1")
            .match_header("accept", "application/json")
            .match_query(Matcher::UrlEncoded("APIKey".into(), "key-123".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"Response":{"Album":[{"AlbumKey":"k1","Name":"Lofts"}]}}"#)
            .create_async()
            .await;

        let albums = client_for(&server, Some("key-123"))
            .list_albums("tok-1", "jane")
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(albums["Response"]["Album"][0]["AlbumKey"], "k1");
    }

    #[tokio::test]
    async fn list_album_images_hits_album_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/api/v2/album/k1!images".into()))
            .with_status(200)
            .with_body(r#"{"Response":{"AlbumImage":[]}}"#)
            .create_async()
            .await;

        let images = client_for(&server, None)
            .list_album_images("tok", "k1")
            .await
            .unwrap();

        mock.assert_async().await;
        assert!(images["Response"]["AlbumImage"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn largest_image_url_extracts_download_url() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v2/image/abc-0!largestimage".into()))
            .with_status(200)
            .with_body(r#"{"Response":{"LargestImage":{"Url":"https://photos.example.com/X5/abc.jpg","Width":4000}}}"#)
            .create_async()
            .await;

        let url = client_for(&server, None)
            .largest_image_url("tok", "/api/v2/image/abc-0")
            .await
            .unwrap();
        assert_eq!(url, "https://photos.example.com/X5/abc.jpg");
    }

    #[tokio::test]
    async fn largest_image_without_url_is_an_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v2/image/abc-0!largestimage".into()))
            .with_status(200)
            .with_body(r#"{"Response":{}}"#)
            .create_async()
            .await;

        let err = client_for(&server, None)
            .largest_image_url("tok", "/api/v2/image/abc-0")
            .await
            .unwrap_err();
        assert!(matches!(err, PhotoServiceError::MissingField(_)));
    }

    #[tokio::test]
    async fn upstream_error_status_is_reported() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", Matcher::Regex(r"^/api/v2/user/jane!albums".into()))
            .with_status(401)
            .create_async()
            .await;

        let err = client_for(&server, None)
            .list_albums("expired", "jane")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            PhotoServiceError::Upstream { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }
}
