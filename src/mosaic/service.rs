//! Mosaic Service for reconstructing windows from stored tiles.
//!
//! The MosaicService is the entry point for region requests. It orchestrates:
//! - Mapping a geographic query point to a pixel window
//! - Resolving the overlapped tiles and their clip rectangles
//! - Fetching and decoding each tile through the [`TileStore`]
//! - Copying each clipped fragment onto a fresh canvas
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        MosaicService                            │
//! │  ┌─────────────────────────────────────────────────────────┐    │
//! │  │                     composite()                         │    │
//! │  │  1. Validate band      3. Fetch + decode tiles          │    │
//! │  │  2. Resolve window     4. Clip + place on canvas        │    │
//! │  └─────────────────────────────────────────────────────────┘    │
//! │           │                    │                    │           │
//! │           ▼                    ▼                    ▼           │
//! │  ┌──────────────────┐  ┌──────────────┐    ┌────────────────┐   │
//! │  │ CoordinateMapper │  │  resolve()   │    │   TileStore    │   │
//! │  └──────────────────┘  └──────────────┘    └────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each call allocates its own canvas and holds no state between calls, so
//! one service can run any number of reconstructions concurrently. A call
//! either returns a fully populated canvas or an error, never a partial one.

use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::error::MosaicError;
use crate::grid::{
    resolve, CoordinateMapper, GridLayout, PixelRounding, TilePlacement, Window,
    DEFAULT_HALF_EXTENT,
};
use crate::raster::Raster;
use crate::store::TileStore;

// =============================================================================
// Region Query
// =============================================================================

/// A request for the window around a geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionQuery {
    /// Latitude in degrees, nominally [-90, 90]
    pub lat: f64,

    /// Longitude in degrees, nominally [-180, 180]
    pub lon: f64,

    /// Band index into the layout's band list
    pub band: usize,

    /// Half the window's edge length in pixels
    pub half_extent: u32,
}

impl RegionQuery {
    /// Create a query with the default half-extent.
    pub fn new(lat: f64, lon: f64, band: usize) -> Self {
        Self {
            lat,
            lon,
            band,
            half_extent: DEFAULT_HALF_EXTENT,
        }
    }

    /// Create a query with a specific half-extent.
    pub fn with_half_extent(lat: f64, lon: f64, band: usize, half_extent: u32) -> Self {
        Self {
            lat,
            lon,
            band,
            half_extent,
        }
    }
}

// =============================================================================
// Fetch Mode
// =============================================================================

/// How tiles overlapping a window are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum FetchMode {
    /// One tile at a time, in row-major order
    Sequential,

    /// All tiles at once, one task per tile
    #[default]
    Parallel,
}

// =============================================================================
// Mosaic Service
// =============================================================================

/// Reconstructs windows of a raster from its tile store.
///
/// # Example
///
/// ```ignore
/// use tile_mosaic::mosaic::{MosaicService, RegionQuery};
///
/// let service = MosaicService::new(store);
/// let canvas = service.region(&RegionQuery::new(0.0, 0.0, 0)).await?;
/// assert_eq!(canvas.width(), 400);
/// ```
pub struct MosaicService {
    store: Arc<dyn TileStore>,
    mapper: CoordinateMapper,
    fetch_mode: FetchMode,
}

impl MosaicService {
    /// Create a service reading from `store`, with parallel fetches and
    /// degree rounding.
    pub fn new(store: Arc<dyn TileStore>) -> Self {
        let mapper = CoordinateMapper::new(store.layout());
        Self {
            store,
            mapper,
            fetch_mode: FetchMode::default(),
        }
    }

    /// Set how tiles are fetched.
    pub fn with_fetch_mode(mut self, fetch_mode: FetchMode) -> Self {
        self.fetch_mode = fetch_mode;
        self
    }

    /// Set the coordinate rounding policy used by [`region`](Self::region).
    pub fn with_rounding(mut self, rounding: PixelRounding) -> Self {
        self.mapper = self.mapper.with_rounding(rounding);
        self
    }

    pub fn store(&self) -> &Arc<dyn TileStore> {
        &self.store
    }

    pub fn layout(&self) -> &GridLayout {
        self.store.layout()
    }

    pub fn fetch_mode(&self) -> FetchMode {
        self.fetch_mode
    }

    /// Pixel window centered on a query point.
    pub fn window_for(&self, query: &RegionQuery) -> Window {
        let (x, y) = self.mapper.to_global_pixel(query.lat, query.lon);
        Window::centered(x, y, query.half_extent)
    }

    /// Reconstruct the window around a geographic point.
    ///
    /// Non-finite coordinates have no pixel and fail with
    /// [`MosaicError::OutOfBounds`].
    pub async fn region(&self, query: &RegionQuery) -> Result<Raster, MosaicError> {
        let window = self.window_for(query);
        if !(query.lat.is_finite() && query.lon.is_finite()) {
            let layout = self.layout();
            return Err(MosaicError::OutOfBounds {
                x0: window.x0(),
                y0: window.y0(),
                x1: window.x1(),
                y1: window.y1(),
                width: layout.width(),
                height: layout.height(),
            });
        }
        self.composite(&window, query.band).await
    }

    /// Reconstruct one band of a pixel window.
    ///
    /// # Errors
    ///
    /// - [`MosaicError::InvalidBand`] if `band` is not in the layout
    /// - [`MosaicError::EmptyWindow`] / [`MosaicError::OutOfBounds`] from
    ///   window resolution, before any tile is fetched
    /// - [`MosaicError::TileNotFound`], [`MosaicError::Decode`] or
    ///   [`MosaicError::Backend`] from the first failing tile fetch
    pub async fn composite(&self, window: &Window, band: usize) -> Result<Raster, MosaicError> {
        let layout = self.store.layout();
        if band >= layout.bands().len() {
            return Err(MosaicError::InvalidBand {
                band,
                bands: layout.bands().len(),
            });
        }

        let start = Instant::now();
        let range = resolve(layout, window)?;
        let mut canvas = Raster::new(range.canvas_width, range.canvas_height);

        match self.fetch_mode {
            FetchMode::Sequential => {
                for placement in &range.placements {
                    let tile = self.store.get(&placement.key(band)).await?;
                    place(&mut canvas, &tile, placement)?;
                }
            }
            FetchMode::Parallel => {
                let tiles = self.fetch_all(&range.placements, band).await?;
                for (placement, tile) in range.placements.iter().zip(&tiles) {
                    place(&mut canvas, tile, placement)?;
                }
            }
        }

        info!(
            x0 = window.x0(),
            y0 = window.y0(),
            band,
            tiles = range.tile_count(),
            elapsed = ?start.elapsed(),
            "Composited window"
        );

        Ok(canvas)
    }

    /// Like [`composite`](Self::composite), but gives up when `cancel` fires.
    ///
    /// Tile fetches already in flight run to completion in the background and
    /// their results are discarded.
    pub async fn composite_cancellable(
        &self,
        window: &Window,
        band: usize,
        cancel: &CancellationToken,
    ) -> Result<Raster, MosaicError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(MosaicError::Cancelled),
            result = self.composite(window, band) => result,
        }
    }

    /// Like [`composite`](Self::composite), but gives up after `timeout`.
    pub async fn composite_with_timeout(
        &self,
        window: &Window,
        band: usize,
        timeout: Duration,
    ) -> Result<Raster, MosaicError> {
        tokio::time::timeout(timeout, self.composite(window, band))
            .await
            .map_err(|_| MosaicError::Cancelled)?
    }

    /// Fetch every placement's tile concurrently, in placement order.
    ///
    /// Returns on the first failure. Remaining tasks are detached, not
    /// aborted.
    async fn fetch_all(
        &self,
        placements: &[TilePlacement],
        band: usize,
    ) -> Result<Vec<Raster>, MosaicError> {
        let handles = placements.iter().map(|placement| {
            let store = Arc::clone(&self.store);
            let key = placement.key(band);
            let handle = tokio::spawn(async move { store.get(&key).await });
            async move {
                handle
                    .await
                    .map_err(|e| MosaicError::TaskFailed(e.to_string()))?
                    .map_err(MosaicError::from)
            }
        });

        try_join_all(handles).await
    }
}

/// Copy a tile's clip rectangle to its canvas offset.
fn place(canvas: &mut Raster, tile: &Raster, placement: &TilePlacement) -> Result<(), MosaicError> {
    canvas.copy_rect(tile, placement.clip, placement.dst_x, placement.dst_y)?;
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
