use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use super::ObjectClient;
use crate::error::IoError;

/// S3-backed implementation of ObjectClient.
///
/// Reads and writes whole objects in one bucket of S3 or an S3-compatible
/// service (MinIO, GCS interoperability endpoint, etc.).
#[derive(Clone)]
pub struct S3ObjectClient {
    client: Client,
    bucket: String,
    identifier: String,
}

impl S3ObjectClient {
    /// Create a client for the given bucket.
    ///
    /// No request is made until the first get or put.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        let bucket = bucket.into();
        let identifier = format!("s3://{}", bucket);
        Self {
            client,
            bucket,
            identifier,
        }
    }

    /// Get the bucket name.
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    fn location(&self, key: &str) -> String {
        format!("s3://{}/{}", self.bucket, key)
    }
}

#[async_trait]
impl ObjectClient for S3ObjectClient {
    async fn get_object(&self, key: &str) -> Result<Bytes, IoError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let is_no_such_key = e
                    .as_service_error()
                    .map(|se| se.is_no_such_key())
                    .unwrap_or(false);

                // Some S3-compatible services answer a bare 404 instead of NoSuchKey
                let status_is_404 = e
                    .raw_response()
                    .map(|r| r.status().as_u16() == 404)
                    .unwrap_or(false);

                if is_no_such_key || status_is_404 {
                    return IoError::NotFound(self.location(key));
                }

                let err_str = e.to_string();
                if err_str.contains("NoSuchKey") || err_str.contains("NotFound") {
                    return IoError::NotFound(self.location(key));
                }

                IoError::S3(err_str)
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| IoError::Connection(e.to_string()))?
            .into_bytes();

        Ok(data)
    }

    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), IoError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type("application/octet-stream")
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| IoError::S3(e.to_string()))?;

        Ok(())
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO:
/// ```ignore
/// let client = create_s3_client(Some("http://localhost:9000"), "us-east-1").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services usually need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
