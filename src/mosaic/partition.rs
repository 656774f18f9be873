//! Partition full rasters into stored tiles.
//!
//! One pass splits each band into the layout's tile grid and writes every
//! tile to every configured store. Writes run concurrently with a bounded
//! limit and in no particular order.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, TryStreamExt};
use serde::Serialize;
use tracing::{debug, info};

use crate::error::PartitionError;
use crate::grid::{GridLayout, TileKey};
use crate::raster::{split_bands, InterleavedRaster, Raster};
use crate::store::TileStore;
use crate::tile::TileEncoding;

/// Default number of tile writes in flight.
pub const DEFAULT_PARTITION_CONCURRENCY: usize = 16;

/// Summary of a finished partition run.
#[derive(Debug, Clone, Serialize)]
pub struct PartitionReport {
    pub dataset: String,

    /// Tiles per band
    pub tiles_per_band: usize,

    /// Tiles written across all bands and stores
    pub tiles_written: usize,

    /// Encodings written, one per store
    pub encodings: Vec<TileEncoding>,

    #[serde(serialize_with = "as_millis")]
    pub elapsed: Duration,
}

/// Writes the tiles of full-size band rasters to one or more stores.
///
/// All stores must share the same layout; the first store's layout is used
/// to cut tiles.
pub struct Partitioner {
    stores: Vec<Arc<dyn TileStore>>,
    concurrency: usize,
}

impl Partitioner {
    pub fn new(store: Arc<dyn TileStore>) -> Self {
        Self {
            stores: vec![store],
            concurrency: DEFAULT_PARTITION_CONCURRENCY,
        }
    }

    /// Also write every tile to `store`.
    pub fn with_store(mut self, store: Arc<dyn TileStore>) -> Self {
        self.stores.push(store);
        self
    }

    /// Limit the number of concurrent tile writes (minimum 1).
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn layout(&self) -> &GridLayout {
        self.stores[0].layout()
    }

    pub fn stores(&self) -> &[Arc<dyn TileStore>] {
        &self.stores
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Split an interleaved raster and partition its leading bands.
    ///
    /// Channels past the layout's band count (e.g. alpha) are ignored.
    pub async fn partition_interleaved(
        &self,
        raster: &InterleavedRaster,
    ) -> Result<PartitionReport, PartitionError> {
        let bands = split_bands(raster, self.layout().bands().len())?;
        self.partition_bands(&bands).await
    }

    /// Partition one full-size raster per layout band.
    ///
    /// # Errors
    ///
    /// - [`PartitionError::BandCount`] / [`PartitionError::DimensionMismatch`]
    ///   before any write if the inputs do not match the layout
    /// - [`PartitionError::Store`] on the first failed write; tiles written
    ///   before it are left in place
    pub async fn partition_bands(
        &self,
        bands: &[Raster],
    ) -> Result<PartitionReport, PartitionError> {
        let layout = self.layout();
        if bands.len() != layout.bands().len() {
            return Err(PartitionError::BandCount {
                expected: layout.bands().len(),
                actual: bands.len(),
            });
        }
        for band in bands {
            if band.width() != layout.width() || band.height() != layout.height() {
                return Err(PartitionError::DimensionMismatch {
                    width: layout.width(),
                    height: layout.height(),
                    actual_width: band.width(),
                    actual_height: band.height(),
                });
            }
        }

        let start = Instant::now();
        let written = AtomicUsize::new(0);

        let jobs = layout
            .keys()
            .flat_map(|key| self.stores.iter().map(move |store| (key, store)))
            .map(Ok::<_, PartitionError>);

        stream::iter(jobs)
            .try_for_each_concurrent(self.concurrency, |(key, store)| {
                let written = &written;
                async move {
                    let tile = cut_tile(layout, &bands[key.band], &key)?;
                    store.put(&key, &tile).await?;
                    written.fetch_add(1, Ordering::Relaxed);
                    debug!(tile = %store.location(&key), "Partitioned tile");
                    Ok(())
                }
            })
            .await?;

        let report = PartitionReport {
            dataset: layout.dataset().to_string(),
            tiles_per_band: layout.tiles_per_band(),
            tiles_written: written.into_inner(),
            encodings: self.stores.iter().map(|s| s.encoding()).collect(),
            elapsed: start.elapsed(),
        };

        info!(
            dataset = %report.dataset,
            tiles = report.tiles_written,
            elapsed = ?report.elapsed,
            "Partition complete"
        );

        Ok(report)
    }
}

/// Crop the tile for `key` out of a full-size band.
fn cut_tile(layout: &GridLayout, band: &Raster, key: &TileKey) -> Result<Raster, PartitionError> {
    let (x, y) = layout.tile_origin(key.row, key.col);
    let (width, height) = layout
        .tile_dims(key.row, key.col)
        .unwrap_or((0, 0));
    Ok(band.crop(x, y, width, height)?)
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}
