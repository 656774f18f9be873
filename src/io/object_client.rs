use async_trait::async_trait;
use bytes::Bytes;

use crate::error::IoError;

/// Whole-object get/put access to a remote key-value store.
///
/// This is the only surface the object-store tile backend needs, so the
/// client's connection and credential lifecycle stays outside the tile code.
/// Implementations must be thread-safe; one client is shared by all
/// concurrent tile fetches.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Fetch the full contents of `key`.
    ///
    /// Returns [`IoError::NotFound`] if the object does not exist.
    async fn get_object(&self, key: &str) -> Result<Bytes, IoError>;

    /// Store `body` under `key`, replacing any existing object.
    async fn put_object(&self, key: &str, body: Bytes) -> Result<(), IoError>;

    /// Identifier of the container objects live in (for logging).
    ///
    /// For S3, this is `s3://bucket`.
    fn identifier(&self) -> &str;
}
