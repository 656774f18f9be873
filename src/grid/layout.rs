//! Grid layout and tile naming.
//!
//! A [`GridLayout`] is the immutable description of one partitioned dataset:
//! raster dimensions, tile size, the ordered band names, and the dataset name
//! used to build storage keys. Every component receives the layout explicitly,
//! so several datasets or tile sizes can be served from one process.
//!
//! # Tile names
//!
//! A tile resolves to a storage name of the form
//!
//! ```text
//! <dataset>.<sourceBands>x<tileSize>x<tileSize>.<i>.<j>.<band>[.<ext>]
//! ```
//!
//! where `i` is the tile column and `j` the tile row, both zero-padded to two
//! digits. Tile sets already on disk were written column first, so the order
//! here is fixed and must not change.

use std::fmt;

use crate::error::LayoutError;

// =============================================================================
// Default Values
// =============================================================================

/// Default dataset name.
pub const DEFAULT_DATASET: &str = "world.topo.bathy.200412";

/// Default raster width in pixels.
pub const DEFAULT_WIDTH: u32 = 21600;

/// Default raster height in pixels.
pub const DEFAULT_HEIGHT: u32 = 10800;

/// Default tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 400;

/// Default band names, in storage order.
pub const DEFAULT_BANDS: [&str; 3] = ["red", "green", "blue"];

/// Default half-extent of a reconstruction window in pixels.
pub const DEFAULT_HALF_EXTENT: u32 = 200;

// =============================================================================
// Tile Key
// =============================================================================

/// Identifies one stored tile independently of its encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileKey {
    /// Tile row (0-indexed from top)
    pub row: u32,

    /// Tile column (0-indexed from left)
    pub col: u32,

    /// Band index into [`GridLayout::bands`]
    pub band: usize,
}

impl TileKey {
    /// Create a new tile key.
    pub fn new(row: u32, col: u32, band: usize) -> Self {
        Self { row, col, band }
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "row {} col {} band {}", self.row, self.col, self.band)
    }
}

// =============================================================================
// Grid Layout
// =============================================================================

/// Immutable description of a tiled dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    dataset: String,
    width: u32,
    height: u32,
    tile_size: u32,
    bands: Vec<String>,
    source_bands: u32,
}

impl GridLayout {
    /// Create a layout, rejecting zero dimensions and empty band lists.
    ///
    /// The source band count defaults to the number of bands; use
    /// [`with_source_bands`](Self::with_source_bands) when the source raster
    /// carried channels that are not stored (e.g. alpha).
    pub fn new(
        dataset: impl Into<String>,
        width: u32,
        height: u32,
        tile_size: u32,
        bands: Vec<String>,
    ) -> Result<Self, LayoutError> {
        if width == 0 {
            return Err(LayoutError::ZeroDimension("width"));
        }
        if height == 0 {
            return Err(LayoutError::ZeroDimension("height"));
        }
        if tile_size == 0 {
            return Err(LayoutError::ZeroDimension("tile_size"));
        }
        if bands.is_empty() {
            return Err(LayoutError::NoBands);
        }

        let source_bands = bands.len() as u32;
        Ok(Self {
            dataset: dataset.into(),
            width,
            height,
            tile_size,
            bands,
            source_bands,
        })
    }

    /// Set the number of channels in the source raster, used in tile names.
    pub fn with_source_bands(mut self, source_bands: u32) -> Result<Self, LayoutError> {
        if (source_bands as usize) < self.bands.len() {
            return Err(LayoutError::TooManyBands {
                bands: self.bands.len(),
                source_bands,
            });
        }
        self.source_bands = source_bands;
        Ok(self)
    }

    pub fn dataset(&self) -> &str {
        &self.dataset
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn bands(&self) -> &[String] {
        &self.bands
    }

    pub fn source_bands(&self) -> u32 {
        self.source_bands
    }

    /// Name of a band, or `None` if the index is out of range.
    pub fn band_name(&self, band: usize) -> Option<&str> {
        self.bands.get(band).map(String::as_str)
    }

    /// Number of tile columns, counting a short final column.
    pub fn tile_cols(&self) -> u32 {
        self.width.div_ceil(self.tile_size)
    }

    /// Number of tile rows, counting a short final row.
    pub fn tile_rows(&self) -> u32 {
        self.height.div_ceil(self.tile_size)
    }

    /// Number of tiles covering one band.
    pub fn tiles_per_band(&self) -> usize {
        self.tile_cols() as usize * self.tile_rows() as usize
    }

    /// Total number of stored tiles across all bands.
    pub fn tile_count(&self) -> usize {
        self.tiles_per_band() * self.bands.len()
    }

    /// Global pixel coordinate of a tile's top-left corner.
    pub fn tile_origin(&self, row: u32, col: u32) -> (u32, u32) {
        (col * self.tile_size, row * self.tile_size)
    }

    /// Actual `(width, height)` of a tile; edge tiles may be short.
    ///
    /// Returns `None` if the tile lies outside the grid.
    pub fn tile_dims(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        if row >= self.tile_rows() || col >= self.tile_cols() {
            return None;
        }
        let (x, y) = self.tile_origin(row, col);
        Some((
            self.tile_size.min(self.width - x),
            self.tile_size.min(self.height - y),
        ))
    }

    /// Check that a key addresses a tile of this grid.
    pub fn contains(&self, key: &TileKey) -> bool {
        key.band < self.bands.len() && key.row < self.tile_rows() && key.col < self.tile_cols()
    }

    /// Storage name of a tile without an encoding extension.
    ///
    /// Used as-is for object-store keys.
    pub fn tile_name(&self, key: &TileKey) -> String {
        let band = self.band_name(key.band).unwrap_or("unknown");
        format!(
            "{}.{}x{}x{}.{:02}.{:02}.{}",
            self.dataset, self.source_bands, self.tile_size, self.tile_size, key.col, key.row, band
        )
    }

    /// Storage name of a tile with the given file extension appended.
    pub fn file_name(&self, key: &TileKey, extension: &str) -> String {
        format!("{}.{}", self.tile_name(key), extension)
    }

    /// All tile keys of the grid, band-major then row-major.
    pub fn keys(&self) -> impl Iterator<Item = TileKey> + '_ {
        let rows = self.tile_rows();
        let cols = self.tile_cols();
        (0..self.bands.len()).flat_map(move |band| {
            (0..rows).flat_map(move |row| (0..cols).map(move |col| TileKey::new(row, col, band)))
        })
    }
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            tile_size: DEFAULT_TILE_SIZE,
            bands: DEFAULT_BANDS.iter().map(|b| b.to_string()).collect(),
            source_bands: DEFAULT_BANDS.len() as u32,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
