//! Partitioning rasters into tiles and compositing windows back out of them.
//!
//! - [`Partitioner`] cuts full band rasters into the layout's grid and writes
//!   each tile to one or more [`TileStore`](crate::store::TileStore)s.
//! - [`MosaicService`] resolves a window to its overlapped tiles, fetches
//!   them and stitches the clipped fragments onto a fresh canvas.

mod partition;
mod service;

pub use partition::{PartitionReport, Partitioner, DEFAULT_PARTITION_CONCURRENCY};
pub use service::{FetchMode, MosaicService, RegionQuery};
