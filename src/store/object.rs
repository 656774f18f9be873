//! Object-store tile store.
//!
//! Each tile is one object whose key is `GridLayout::tile_name(key)`, with no
//! extension. Existing buckets were written this way; the store's encoding
//! decides how payloads are interpreted.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use crate::error::{IoError, StoreError};
use crate::grid::{GridLayout, TileKey};
use crate::io::ObjectClient;
use crate::raster::Raster;
use crate::tile::TileEncoding;

use super::{decode_tile, encode_tile, TileStore};

/// Tile store backed by an [`ObjectClient`].
///
/// # Example
///
/// ```ignore
/// use tile_mosaic::io::{create_s3_client, S3ObjectClient};
/// use tile_mosaic::store::ObjectTileStore;
///
/// let client = create_s3_client(None, "us-east-1").await;
/// let objects = S3ObjectClient::new(client, "bluemarble");
/// let store = ObjectTileStore::new(objects, layout, TileEncoding::Snappy);
///
/// let tile = store.get(&TileKey::new(13, 27, 0)).await?;
/// ```
pub struct ObjectTileStore<C: ObjectClient> {
    client: C,
    layout: Arc<GridLayout>,
    encoding: TileEncoding,
}

impl<C: ObjectClient> ObjectTileStore<C> {
    pub fn new(client: C, layout: Arc<GridLayout>, encoding: TileEncoding) -> Self {
        Self {
            client,
            layout,
            encoding,
        }
    }

    /// Get a reference to the underlying client.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Object key of a tile.
    pub fn object_key(&self, key: &TileKey) -> String {
        self.layout.tile_name(key)
    }
}

#[async_trait]
impl<C: ObjectClient> TileStore for ObjectTileStore<C> {
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn encoding(&self) -> TileEncoding {
        self.encoding
    }

    fn location(&self, key: &TileKey) -> String {
        format!("{}/{}", self.client.identifier(), self.object_key(key))
    }

    async fn get(&self, key: &TileKey) -> Result<Raster, StoreError> {
        let object_key = self.object_key(key);
        let location = self.location(key);

        let payload = self
            .client
            .get_object(&object_key)
            .await
            .map_err(|e| match e {
                IoError::NotFound(_) => StoreError::NotFound {
                    key: location.clone(),
                },
                other => StoreError::Backend(other),
            })?;

        debug!(object = %location, bytes = payload.len(), "Fetched tile object");
        decode_tile(&self.layout, self.encoding, key, &location, &payload)
    }

    async fn put(&self, key: &TileKey, tile: &Raster) -> Result<(), StoreError> {
        let location = self.location(key);
        let payload = encode_tile(&self.layout, self.encoding, key, &location, tile)?;
        let size = payload.len();

        self.client
            .put_object(&self.object_key(key), Bytes::from(payload))
            .await
            .map_err(|source| StoreError::Write {
                key: location.clone(),
                source,
            })?;

        debug!(object = %location, bytes = size, "Stored tile object");
        Ok(())
    }
}
