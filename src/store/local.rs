//! Local filesystem tile store.
//!
//! Each tile is one file directly under the store's root directory, named
//! `GridLayout::file_name(key, encoding.extension())`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{IoError, StoreError};
use crate::grid::{GridLayout, TileKey};
use crate::raster::Raster;
use crate::tile::TileEncoding;

use super::{decode_tile, encode_tile, TileStore};

/// Tile store backed by one file per tile.
#[derive(Debug, Clone)]
pub struct LocalTileStore {
    root: PathBuf,
    layout: Arc<GridLayout>,
    encoding: TileEncoding,
}

impl LocalTileStore {
    /// Create a store rooted at `root`.
    ///
    /// The directory is created on the first write if it does not exist.
    pub fn new(root: impl Into<PathBuf>, layout: Arc<GridLayout>, encoding: TileEncoding) -> Self {
        Self {
            root: root.into(),
            layout,
            encoding,
        }
    }

    /// Get the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding a tile.
    pub fn path(&self, key: &TileKey) -> PathBuf {
        self.root
            .join(self.layout.file_name(key, self.encoding.extension()))
    }
}

fn file_error(path: &Path, err: &std::io::Error) -> IoError {
    IoError::File {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl TileStore for LocalTileStore {
    fn layout(&self) -> &GridLayout {
        &self.layout
    }

    fn encoding(&self) -> TileEncoding {
        self.encoding
    }

    fn location(&self, key: &TileKey) -> String {
        self.path(key).display().to_string()
    }

    async fn get(&self, key: &TileKey) -> Result<Raster, StoreError> {
        let path = self.path(key);
        let location = path.display().to_string();

        let payload = match tokio::fs::read(&path).await {
            Ok(payload) => payload,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound { key: location });
            }
            Err(e) => return Err(StoreError::Backend(file_error(&path, &e))),
        };

        debug!(path = %location, bytes = payload.len(), "Read tile file");
        decode_tile(&self.layout, self.encoding, key, &location, &payload)
    }

    async fn put(&self, key: &TileKey, tile: &Raster) -> Result<(), StoreError> {
        let path = self.path(key);
        let location = path.display().to_string();
        let payload = encode_tile(&self.layout, self.encoding, key, &location, tile)?;

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| StoreError::Write {
                key: location.clone(),
                source: file_error(&self.root, &e),
            })?;

        tokio::fs::write(&path, &payload)
            .await
            .map_err(|e| StoreError::Write {
                key: location.clone(),
                source: file_error(&path, &e),
            })?;

        debug!(path = %location, bytes = payload.len(), "Wrote tile file");
        Ok(())
    }
}
