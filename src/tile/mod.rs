//! Tile payload codecs.
//!
//! This module owns the "encode byte buffer → tile payload" and
//! "decode tile payload → byte buffer" contract shared by every store backend.
//!
//! # Components
//!
//! - [`TileEncoding`]: The closed set of payload encodings (PNG, raw, DEFLATE, Snappy)
//! - [`compare_encodings`]: Encodes one raster with several encodings and reports
//!   payload sizes and timings
//!
//! # Example
//!
//! ```
//! use tile_mosaic::raster::Raster;
//! use tile_mosaic::tile::TileEncoding;
//!
//! let tile = Raster::from_vec(2, 2, vec![1, 2, 3, 4]).unwrap();
//! let payload = TileEncoding::Snappy.encode(&tile).unwrap();
//! let decoded = TileEncoding::Snappy.decode(&payload, 2, 2).unwrap();
//! assert_eq!(decoded, tile);
//! ```

mod codec;
mod compare;

pub use codec::TileEncoding;
pub use compare::{compare_encodings, CodecReport};
