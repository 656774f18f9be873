//! Tile storage backends.
//!
//! A [`TileStore`] fetches and stores single tiles by [`TileKey`], hiding
//! where payloads live and how they are encoded. Reconstruction and partition
//! code is identical for every backend.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │     MosaicService / Partitioner         │
//! └────────────────────┬────────────────────┘
//!                      │  get / put (TileKey, Raster)
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            TileStore Trait              │
//! │   (layout-aware, encoding-agnostic)     │
//! └────────────────────┬────────────────────┘
//!                      │
//!          ┌───────────┴───────────┐
//!          ▼                       ▼
//! ┌─────────────────┐    ┌─────────────────────┐
//! │ LocalTileStore  │    │ ObjectTileStore<C>  │
//! │ (files on disk) │    │ (ObjectClient: S3)  │
//! └─────────────────┘    └─────────────────────┘
//! ```
//!
//! Both backends accept any [`TileEncoding`]. Which combination is used is a
//! [`StoreConfig`] choice resolved once by [`open_store`].

mod local;
mod object;

pub use local::LocalTileStore;
pub use object::ObjectTileStore;

use std::sync::Arc;

use async_trait::async_trait;
use clap::ValueEnum;

use crate::error::{CodecError, StoreError};
use crate::grid::{GridLayout, TileKey};
use crate::io::{create_s3_client, S3ObjectClient};
use crate::raster::Raster;
use crate::tile::TileEncoding;

/// Default bucket for the object-store backend.
pub const DEFAULT_BUCKET: &str = "bluemarble";

/// Default AWS region.
pub const DEFAULT_REGION: &str = "us-east-1";

// =============================================================================
// TileStore Trait
// =============================================================================

/// Fetch and store decoded tiles by key.
///
/// Stores never mutate a tile on read, and hold no per-call state, so one
/// store can serve any number of concurrent reconstructions.
#[async_trait]
pub trait TileStore: Send + Sync {
    /// Layout the store's keys refer to.
    fn layout(&self) -> &GridLayout;

    /// Encoding of stored payloads.
    fn encoding(&self) -> TileEncoding;

    /// Storage location of a tile (file path or object key).
    fn location(&self, key: &TileKey) -> String;

    /// Fetch and decode a tile.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if no payload exists for the key
    /// - [`StoreError::Decode`] if the payload does not decode to the tile's
    ///   exact size
    /// - [`StoreError::Backend`] for any other I/O failure
    async fn get(&self, key: &TileKey) -> Result<Raster, StoreError>;

    /// Encode and store a tile, replacing any existing payload.
    ///
    /// # Errors
    ///
    /// - [`StoreError::Encode`] if the tile has the wrong size for its key
    /// - [`StoreError::Write`] on I/O failure
    async fn put(&self, key: &TileKey, tile: &Raster) -> Result<(), StoreError>;
}

/// Size a key's tile must have, or `NotFound` for keys outside the grid.
fn expected_dims(
    layout: &GridLayout,
    key: &TileKey,
    location: &str,
) -> Result<(u32, u32), StoreError> {
    layout
        .tile_dims(key.row, key.col)
        .filter(|_| layout.contains(key))
        .ok_or_else(|| StoreError::NotFound {
            key: location.to_string(),
        })
}

/// Encode a tile after checking it has the size its key requires.
fn encode_tile(
    layout: &GridLayout,
    encoding: TileEncoding,
    key: &TileKey,
    location: &str,
    tile: &Raster,
) -> Result<Vec<u8>, StoreError> {
    let (width, height) = expected_dims(layout, key, location)?;
    if tile.width() != width || tile.height() != height {
        return Err(StoreError::Encode {
            key: location.to_string(),
            source: CodecError::DimensionMismatch {
                width,
                height,
                actual_width: tile.width(),
                actual_height: tile.height(),
            },
        });
    }
    encoding.encode(tile).map_err(|source| StoreError::Encode {
        key: location.to_string(),
        source,
    })
}

/// Decode a payload to the size its key requires.
fn decode_tile(
    layout: &GridLayout,
    encoding: TileEncoding,
    key: &TileKey,
    location: &str,
    payload: &[u8],
) -> Result<Raster, StoreError> {
    let (width, height) = expected_dims(layout, key, location)?;
    encoding
        .decode(payload, width, height)
        .map_err(|source| StoreError::Decode {
            key: location.to_string(),
            source,
        })
}

// =============================================================================
// Backend Selection
// =============================================================================

/// Where tiles are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreBackend {
    /// One file per tile under a base directory
    LocalFile,

    /// One object per tile in an S3-compatible bucket
    ObjectStore,
}

/// Backend configuration, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub encoding: TileEncoding,

    /// Directory for `local-file`, bucket name for `object-store`
    pub base: String,

    /// Custom S3 endpoint for S3-compatible services
    pub s3_endpoint: Option<String>,

    pub s3_region: String,
}

impl StoreConfig {
    /// Local files under `base` with the given encoding.
    pub fn local(base: impl Into<String>, encoding: TileEncoding) -> Self {
        Self {
            backend: StoreBackend::LocalFile,
            encoding,
            base: base.into(),
            s3_endpoint: None,
            s3_region: DEFAULT_REGION.to_string(),
        }
    }

    /// Objects in `bucket` with the given encoding.
    pub fn object_store(bucket: impl Into<String>, encoding: TileEncoding) -> Self {
        Self {
            backend: StoreBackend::ObjectStore,
            encoding,
            base: bucket.into(),
            s3_endpoint: None,
            s3_region: DEFAULT_REGION.to_string(),
        }
    }
}

/// Open the store described by `config`.
///
/// For the object-store backend this builds an S3 client from the ambient
/// AWS configuration; no request is made until the first tile access.
pub async fn open_store(config: &StoreConfig, layout: Arc<GridLayout>) -> Arc<dyn TileStore> {
    match config.backend {
        StoreBackend::LocalFile => Arc::new(LocalTileStore::new(
            config.base.as_str(),
            layout,
            config.encoding,
        )),
        StoreBackend::ObjectStore => {
            let client =
                create_s3_client(config.s3_endpoint.as_deref(), &config.s3_region).await;
            let objects = S3ObjectClient::new(client, config.base.as_str());
            Arc::new(ObjectTileStore::new(objects, layout, config.encoding))
        }
    }
}
