//! Command-line configuration for tile-mosaic.
//!
//! Every option can also be set through an environment variable with the
//! `MOSAIC_` prefix:
//!
//! - `MOSAIC_DATASET` - Dataset name used in tile names (default: world.topo.bathy.200412)
//! - `MOSAIC_WIDTH` / `MOSAIC_HEIGHT` - Full raster size (default: 21600 x 10800)
//! - `MOSAIC_TILE_SIZE` - Tile edge length (default: 400)
//! - `MOSAIC_BANDS` - Comma-separated band names (default: red,green,blue)
//! - `MOSAIC_SOURCE_BANDS` - Channel count of the source raster, used in tile names
//! - `MOSAIC_BACKEND` - `local-file` or `object-store` (default: local-file)
//! - `MOSAIC_ENCODING` - `image`, `raw`, `entropy-coded`, `block-compressed`,
//!   `gzip`, `lzw` or `lz4`
//! - `MOSAIC_BASE` - Tile directory or bucket name
//! - `MOSAIC_S3_ENDPOINT` - Custom S3 endpoint for S3-compatible services
//! - `MOSAIC_S3_REGION` - AWS region (default: us-east-1)
//!
//! # Example
//!
//! ```text
//! tile-mosaic partition --input world.png --base tiles --also-encode raw,block-compressed
//! tile-mosaic region --base tiles --lat 0 --lon 0 --band green --output center.png
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::error::LayoutError;
use crate::grid::{
    GridLayout, PixelRounding, DEFAULT_DATASET, DEFAULT_HALF_EXTENT, DEFAULT_HEIGHT,
    DEFAULT_TILE_SIZE, DEFAULT_WIDTH,
};
use crate::mosaic::{FetchMode, DEFAULT_PARTITION_CONCURRENCY};
use crate::store::{StoreBackend, StoreConfig, DEFAULT_BUCKET, DEFAULT_REGION};
use crate::tile::TileEncoding;

// =============================================================================
// Default Values
// =============================================================================

/// Default band list, comma-separated.
pub const DEFAULT_BANDS_ARG: &str = "red,green,blue";

/// Default tile directory for the local-file backend.
pub const DEFAULT_TILE_DIR: &str = "tiles";

// =============================================================================
// CLI Structure
// =============================================================================

/// tile-mosaic - Partition large rasters into tiles and reconstruct windows.
#[derive(Parser, Debug, Clone)]
#[command(name = "tile-mosaic")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Split a source image into bands and write its tiles
    Partition(PartitionConfig),

    /// Reconstruct the window around a point from stored tiles
    Region(RegionConfig),

    /// Crop the window around a point directly from a source image
    Extract(ExtractConfig),

    /// Compare tile encodings on one band of a source image
    Compare(CompareConfig),
}

impl Command {
    pub fn verbose(&self) -> bool {
        match self {
            Command::Partition(c) => c.verbose,
            Command::Region(c) => c.verbose,
            Command::Extract(c) => c.verbose,
            Command::Compare(c) => c.verbose,
        }
    }
}

/// How reports are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,

    /// Pretty-printed JSON
    Json,
}

// =============================================================================
// Shared Argument Groups
// =============================================================================

/// Tile grid description.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct GridArgs {
    /// Dataset name used as the tile name prefix.
    #[arg(long, default_value = DEFAULT_DATASET, env = "MOSAIC_DATASET")]
    pub dataset: String,

    /// Full raster width in pixels.
    #[arg(long, default_value_t = DEFAULT_WIDTH, env = "MOSAIC_WIDTH")]
    pub width: u32,

    /// Full raster height in pixels.
    #[arg(long, default_value_t = DEFAULT_HEIGHT, env = "MOSAIC_HEIGHT")]
    pub height: u32,

    /// Tile edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "MOSAIC_TILE_SIZE")]
    pub tile_size: u32,

    /// Band names in source channel order.
    #[arg(
        long,
        default_value = DEFAULT_BANDS_ARG,
        env = "MOSAIC_BANDS",
        value_delimiter = ','
    )]
    pub bands: Vec<String>,

    /// Channel count of the source raster, if it has unstored channels.
    #[arg(long, env = "MOSAIC_SOURCE_BANDS")]
    pub source_bands: Option<u32>,
}

impl GridArgs {
    pub fn to_layout(&self) -> Result<GridLayout, LayoutError> {
        let layout = GridLayout::new(
            self.dataset.clone(),
            self.width,
            self.height,
            self.tile_size,
            self.bands.clone(),
        )?;
        match self.source_bands {
            Some(n) => layout.with_source_bands(n),
            None => Ok(layout),
        }
    }

    /// Resolve a band given by name or by index.
    pub fn band_index(&self, band: &str) -> Result<usize, String> {
        if let Some(index) = self.bands.iter().position(|b| b == band) {
            return Ok(index);
        }
        match band.parse::<usize>() {
            Ok(index) if index < self.bands.len() => Ok(index),
            _ => Err(format!(
                "Unknown band '{}'. Expected one of: {}",
                band,
                self.bands.join(", ")
            )),
        }
    }
}

/// Tile store selection.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct StoreArgs {
    /// Where tiles live.
    #[arg(long, value_enum, default_value_t = StoreBackend::LocalFile, env = "MOSAIC_BACKEND")]
    pub backend: StoreBackend,

    /// How tile payloads are encoded.
    #[arg(long, value_enum, default_value_t = TileEncoding::Png, env = "MOSAIC_ENCODING")]
    pub encoding: TileEncoding,

    /// Tile directory (local-file) or bucket name (object-store).
    ///
    /// Defaults to `tiles` or `bluemarble` respectively.
    #[arg(long, env = "MOSAIC_BASE")]
    pub base: Option<String>,

    /// Custom S3 endpoint URL for S3-compatible services (MinIO, etc.).
    #[arg(long, env = "MOSAIC_S3_ENDPOINT")]
    pub s3_endpoint: Option<String>,

    /// AWS region for S3.
    #[arg(long, default_value = DEFAULT_REGION, env = "MOSAIC_S3_REGION")]
    pub s3_region: String,
}

impl StoreArgs {
    pub fn base(&self) -> String {
        match (&self.base, self.backend) {
            (Some(base), _) => base.clone(),
            (None, StoreBackend::LocalFile) => DEFAULT_TILE_DIR.to_string(),
            (None, StoreBackend::ObjectStore) => DEFAULT_BUCKET.to_string(),
        }
    }

    pub fn to_store_config(&self) -> StoreConfig {
        self.to_store_config_with(self.encoding)
    }

    /// Same backend and location with a different encoding.
    pub fn to_store_config_with(&self, encoding: TileEncoding) -> StoreConfig {
        StoreConfig {
            backend: self.backend,
            encoding,
            base: self.base(),
            s3_endpoint: self.s3_endpoint.clone(),
            s3_region: self.s3_region.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.base.as_deref().is_some_and(str::is_empty) {
            return Err("Tile base must not be empty. Set --base or MOSAIC_BASE".to_string());
        }
        if self.backend == StoreBackend::ObjectStore && self.s3_region.is_empty() {
            return Err("S3 region is required. Set --s3-region or MOSAIC_S3_REGION".to_string());
        }
        Ok(())
    }
}

/// Geographic query point.
#[derive(Args, Debug, Clone, PartialEq)]
pub struct PointArgs {
    /// Latitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lat: f64,

    /// Longitude in degrees.
    #[arg(long, allow_negative_numbers = true)]
    pub lon: f64,

    /// Band name or index.
    #[arg(long)]
    pub band: String,

    /// Half the window's edge length in pixels.
    #[arg(long, default_value_t = DEFAULT_HALF_EXTENT)]
    pub half_extent: u32,

    /// Where degrees are rounded when mapping to pixels.
    #[arg(long, value_enum, default_value_t = PixelRounding::Degree)]
    pub rounding: PixelRounding,
}

impl PointArgs {
    pub fn validate(&self) -> Result<(), String> {
        if !self.lat.is_finite() || !self.lon.is_finite() {
            return Err("Latitude and longitude must be finite".to_string());
        }
        if self.half_extent == 0 {
            return Err("half_extent must be greater than 0".to_string());
        }
        Ok(())
    }
}

fn validate_grid(grid: &GridArgs) -> Result<(), String> {
    grid.to_layout().map(|_| ()).map_err(|e| e.to_string())
}

// =============================================================================
// Partition Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PartitionConfig {
    /// Source image (PNG) covering the whole grid.
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// Additional encodings written next to the primary one.
    #[arg(long, value_enum, value_delimiter = ',')]
    pub also_encode: Vec<TileEncoding>,

    /// Maximum concurrent tile writes.
    #[arg(long, default_value_t = DEFAULT_PARTITION_CONCURRENCY, env = "MOSAIC_CONCURRENCY")]
    pub concurrency: usize,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl PartitionConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_grid(&self.grid)?;
        self.store.validate()?;
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Primary encoding followed by any additional ones, without repeats.
    pub fn encodings(&self) -> Vec<TileEncoding> {
        let mut encodings = vec![self.store.encoding];
        for &encoding in &self.also_encode {
            if !encodings.contains(&encoding) {
                encodings.push(encoding);
            }
        }
        encodings
    }
}

// =============================================================================
// Region Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct RegionConfig {
    #[command(flatten)]
    pub point: PointArgs,

    #[command(flatten)]
    pub grid: GridArgs,

    #[command(flatten)]
    pub store: StoreArgs,

    /// How overlapped tiles are fetched.
    #[arg(long, value_enum, default_value_t = FetchMode::Parallel)]
    pub fetch: FetchMode,

    /// Abort the reconstruction after this many milliseconds.
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Output PNG path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl RegionConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_grid(&self.grid)?;
        self.store.validate()?;
        self.point.validate()?;
        self.grid.band_index(&self.point.band)?;
        if self.timeout_ms == Some(0) {
            return Err("timeout_ms must be greater than 0".to_string());
        }
        Ok(())
    }
}

// =============================================================================
// Extract Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct ExtractConfig {
    /// Source image (PNG) covering the whole grid.
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub point: PointArgs,

    #[command(flatten)]
    pub grid: GridArgs,

    /// Output PNG path.
    #[arg(short, long)]
    pub output: PathBuf,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<(), String> {
        validate_grid(&self.grid)?;
        self.point.validate()?;
        self.grid.band_index(&self.point.band)?;
        Ok(())
    }
}

// =============================================================================
// Compare Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct CompareConfig {
    /// Source image (PNG).
    #[arg(long)]
    pub input: PathBuf,

    /// Channel of the source image to compare on.
    #[arg(long, default_value_t = 0)]
    pub channel: usize,

    /// Encodings to compare (default: all).
    #[arg(long, value_enum, value_delimiter = ',')]
    pub encodings: Vec<TileEncoding>,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl CompareConfig {
    pub fn encodings(&self) -> Vec<TileEncoding> {
        if self.encodings.is_empty() {
            TileEncoding::ALL.to_vec()
        } else {
            self.encodings.clone()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
