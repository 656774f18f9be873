//! Tile grid geometry.
//!
//! Pure functions with no I/O: the dataset layout and tile naming, mapping of
//! geographic points to pixels, and resolution of query windows into clipped
//! tile placements.
//!
//! ```text
//! (lat, lon) ──► CoordinateMapper ──► (x, y) ──► Window ──► resolve() ──► TileRange
//!                                                                         │
//!                                                      placements (row-major, clipped)
//! ```

mod coords;
mod layout;
mod window;

pub use coords::{CoordinateMapper, PixelRounding};
pub use layout::{
    GridLayout, TileKey, DEFAULT_BANDS, DEFAULT_DATASET, DEFAULT_HALF_EXTENT, DEFAULT_HEIGHT,
    DEFAULT_TILE_SIZE, DEFAULT_WIDTH,
};
pub use window::{resolve, ClipRect, TilePlacement, TileRange, Window};
