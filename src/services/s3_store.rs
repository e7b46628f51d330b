//! S3 (and S3-compatible) [`BlobStore`] built on the AWS SDK.
//!
//! Visibility is sent per write as the `x-amz-acl` canned ACL through the
//! request builder, so it is covered by the SigV4 signature.

use crate::{
    config::StorageConfig,
    models::asset::{ObjectKey, Visibility},
    services::blob_store::{BlobStore, StorageError, StorageResult, StoredObject},
};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::{
    Client,
    config::Credentials,
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::ObjectCannedAcl,
};
use bytes::Bytes;
use std::time::Instant;

#[derive(Clone, Debug)]
pub struct S3Store {
    client: Client,
    bucket: String,
    acl: Option<ObjectCannedAcl>,
}

impl S3Store {
    /// Build a client from explicit configuration.
    ///
    /// Credentials fall back to the SDK provider chain when unset. A custom
    /// endpoint switches to path-style addressing.
    pub async fn new(config: &StorageConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()));

        if let (Some(id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                id.clone(),
                secret.clone(),
                None,
                None,
                "listing-media",
            ));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint.clone());
        }

        let sdk_config = loader.load().await;
        let client = Client::from_conf(
            aws_sdk_s3::config::Builder::from(&sdk_config)
                .force_path_style(config.endpoint.is_some())
                .build(),
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            acl: canned_acl(config.visibility),
        }
    }
}

fn canned_acl(visibility: Visibility) -> Option<ObjectCannedAcl> {
    match visibility {
        Visibility::PublicRead => Some(ObjectCannedAcl::PublicRead),
        Visibility::Private => None,
    }
}

fn describe(err: impl std::error::Error) -> String {
    DisplayErrorContext(err).to_string()
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(&self, key: &ObjectKey, data: Bytes, content_type: &str) -> StorageResult<()> {
        let start = Instant::now();
        let size = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .body(ByteStream::from(data))
            .content_type(content_type)
            .set_acl(self.acl.clone())
            .send()
            .await
            .map_err(|e| {
                let cause = describe(e);
                tracing::error!(
                    error = %cause,
                    bucket = %self.bucket,
                    key = %key,
                    size_bytes = size,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 upload failed"
                );
                StorageError::backend("write", key, cause)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            content_type,
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 upload successful"
        );
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> StorageResult<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| StorageError::backend("read", key, describe(e)))?;

        let content_type = output.content_type().map(str::to_string);
        let data = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::backend("read", key, describe(e)))?
            .into_bytes();
        Ok(StoredObject { data, content_type })
    }

    // S3 answers 204 for absent keys, so a missing object is already success.
    async fn delete(&self, key: &ObjectKey) -> StorageResult<()> {
        let start = Instant::now();

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|e| {
                let cause = describe(e);
                tracing::error!(
                    error = %cause,
                    bucket = %self.bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 delete failed"
                );
                StorageError::backend("delete", key, cause)
            })?;

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 delete successful"
        );
        Ok(())
    }

    async fn verify_reachable(&self) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| StorageError::backend("probe", &ObjectKey::new(&self.bucket), describe(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
        task::JoinHandle,
    };

    /// Accept one connection, answer `200 OK`, and return the request head
    /// (request line and headers, lowercased).
    fn capture_request(listener: TcpListener) -> JoinHandle<String> {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];

            let head_end = loop {
                let n = socket.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed before headers");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };
            let head = String::from_utf8_lossy(&buf[..head_end]).to_ascii_lowercase();

            if head.contains("expect: 100-continue") {
                socket.write_all(b"HTTP/1.1 100 Continue\r\n\r\n").await.unwrap();
            }
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            let mut received = buf.len() - head_end;
            while received < body_len {
                let n = socket.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                received += n;
            }

            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            head
        })
    }

    async fn store_against(listener: &TcpListener, visibility: Visibility) -> S3Store {
        let endpoint = format!("http://{}", listener.local_addr().unwrap());
        let mut config = StorageConfig::new("listings", "us-east-1").with_endpoint(endpoint);
        config.access_key_id = Some("AKIDEXAMPLE".into());
        config.secret_access_key = Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into());
        config.visibility = visibility;
        S3Store::new(&config).await
    }

    fn signed_headers(head: &str) -> Vec<String> {
        let auth = head
            .lines()
            .find(|line| line.starts_with("authorization:"))
            .expect("request is signed");
        let list = auth
            .split("signedheaders=")
            .nth(1)
            .unwrap()
            .split(',')
            .next()
            .unwrap();
        list.split(';').map(str::to_string).collect()
    }

    #[tokio::test]
    async fn public_read_acl_is_part_of_the_signature() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let store = store_against(&listener, Visibility::PublicRead).await;
        let captured = capture_request(listener);

        let _ = tokio::time::timeout(
            Duration::from_secs(10),
            store.put(&ObjectKey::new("properties/a.png"), Bytes::from_static(b"png"), "image/png"),
        )
        .await;

        let head = captured.await.unwrap();
        assert!(head.starts_with("put /listings/properties/a.png"));
        assert!(head.contains("x-amz-acl: public-read"));
        let signed = signed_headers(&head);
        assert!(signed.contains(&"x-amz-acl".to_string()), "signed: {signed:?}");
        assert!(signed.contains(&"content-type".to_string()));
    }

    #[tokio::test]
    async fn private_visibility_sends_no_acl() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let store = store_against(&listener, Visibility::Private).await;
        let captured = capture_request(listener);

        let _ = tokio::time::timeout(
            Duration::from_secs(10),
            store.put(&ObjectKey::new("videos/b.mp4"), Bytes::from_static(b"mp4"), "video/mp4"),
        )
        .await;

        let head = captured.await.unwrap();
        assert!(!head.contains("x-amz-acl"));
    }
}
