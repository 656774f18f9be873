//! # tile-mosaic
//!
//! Partition very large rasters into a fixed grid of square tiles, store the
//! tiles on local disk or in S3-compatible object storage, and reconstruct
//! arbitrary rectangular windows on demand by fetching only the overlapped
//! tiles.
//!
//! ## Features
//!
//! - **Geographic queries**: map a latitude/longitude to a pixel window on an
//!   equirectangular world raster
//! - **Exact reconstruction**: a window composited from tiles is
//!   byte-identical to a direct crop of the source raster
//! - **Pluggable storage**: local files or S3 objects behind one `TileStore`
//!   trait
//! - **Several tile encodings**: PNG, raw bytes, DEFLATE and Snappy
//! - **Concurrent fetches**: one task per overlapped tile, with cancellation
//!   and timeouts
//!
//! ## Architecture
//!
//! - [`grid`] - Layout, coordinate mapping and window-to-tile resolution
//! - [`raster`] - Single-band and interleaved rasters, band splitting, PNG I/O
//! - [`tile`] - Tile payload encodings and their comparison
//! - [`io`] - Whole-object get/put against S3
//! - [`store`] - Tile stores over local files or objects
//! - [`mosaic`] - Partitioning and window reconstruction
//! - [`config`] - CLI and configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tile_mosaic::{open_store, GridLayout, MosaicService, RegionQuery, StoreConfig, TileEncoding};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let layout = Arc::new(GridLayout::default());
//!     let store = open_store(&StoreConfig::local("tiles", TileEncoding::Png), layout).await;
//!
//!     let service = MosaicService::new(store);
//!     let canvas = service.region(&RegionQuery::new(48.85, 2.35, 0)).await?;
//!     assert_eq!((canvas.width(), canvas.height()), (400, 400));
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod grid;
pub mod io;
pub mod mosaic;
pub mod raster;
pub mod store;
pub mod tile;

// Re-export commonly used types
pub use config::{Cli, Command};
pub use error::{
    CodecError, IoError, LayoutError, MosaicError, PartitionError, RasterError, StoreError,
};
pub use grid::{resolve, CoordinateMapper, GridLayout, PixelRounding, TileKey, TileRange, Window};
pub use io::{create_s3_client, ObjectClient, S3ObjectClient};
pub use mosaic::{FetchMode, MosaicService, PartitionReport, Partitioner, RegionQuery};
pub use raster::{split_bands, InterleavedRaster, Raster};
pub use store::{open_store, LocalTileStore, ObjectTileStore, StoreConfig, TileStore};
pub use tile::{compare_encodings, CodecReport, TileEncoding};
