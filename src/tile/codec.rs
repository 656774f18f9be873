//! Tile payload encodings.
//!
//! Every encoding satisfies the same contract: a tile [`Raster`] encodes to an
//! opaque payload, and a payload decodes back to exactly `width * height`
//! samples or fails. Stores and the compositor never look inside payloads.
//!
//! | Encoding          | Extension | Payload                              |
//! |-------------------|-----------|--------------------------------------|
//! | `image`           | `png`     | 8-bit greyscale PNG                  |
//! | `raw`             | `raw`     | packed samples, row-major            |
//! | `entropy-coded`   | `flt`     | raw DEFLATE stream (no zlib header)  |
//! | `block-compressed`| `snpy`    | Snappy raw block format              |
//! | `gzip`            | `gzip`    | gzip member                          |
//! | `lzw`             | `lzw`     | LZW, LSB-first, 8-bit literals       |
//! | `lz4`             | `lz4`     | LZ4 raw block format                 |
//!
//! Decoders never produce more than one sample past the expected count, so an
//! oversized or hostile stream fails with [`CodecError::SizeMismatch`] without
//! inflating it in full.

use std::fmt;
use std::io::{Cursor, Read, Write};

use clap::ValueEnum;
use flate2::read::{DeflateDecoder, GzDecoder};
use flate2::write::{DeflateEncoder, GzEncoder};
use flate2::Compression;
use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};
use serde::Serialize;
use weezl::{BitOrder, LzwStatus};

use crate::error::CodecError;
use crate::raster::Raster;

/// Encoding of stored tile payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TileEncoding {
    /// PNG container
    #[value(name = "image")]
    #[serde(rename = "image")]
    Png,

    /// Uncompressed byte dump
    Raw,

    /// DEFLATE-compressed byte dump
    #[value(name = "entropy-coded")]
    #[serde(rename = "entropy-coded")]
    Deflate,

    /// Snappy-compressed byte dump
    #[value(name = "block-compressed")]
    #[serde(rename = "block-compressed")]
    Snappy,

    /// gzip-compressed byte dump
    Gzip,

    /// LZW-compressed byte dump
    Lzw,

    /// LZ4-compressed byte dump
    Lz4,
}

impl TileEncoding {
    /// All encodings, in the order the codec comparison reports them.
    pub const ALL: [TileEncoding; 7] = [
        TileEncoding::Png,
        TileEncoding::Raw,
        TileEncoding::Deflate,
        TileEncoding::Snappy,
        TileEncoding::Gzip,
        TileEncoding::Lzw,
        TileEncoding::Lz4,
    ];

    /// File extension used by local stores.
    pub fn extension(&self) -> &'static str {
        match self {
            TileEncoding::Png => "png",
            TileEncoding::Raw => "raw",
            TileEncoding::Deflate => "flt",
            TileEncoding::Snappy => "snpy",
            TileEncoding::Gzip => "gzip",
            TileEncoding::Lzw => "lzw",
            TileEncoding::Lz4 => "lz4",
        }
    }

    /// Encode a tile into a payload.
    pub fn encode(&self, tile: &Raster) -> Result<Vec<u8>, CodecError> {
        match self {
            TileEncoding::Png => encode_png(tile),
            TileEncoding::Raw => Ok(tile.to_packed()),
            TileEncoding::Deflate => {
                // Level 1 keeps partitioning fast; tiles are read far more than written.
                let mut encoder = DeflateEncoder::new(Vec::new(), Compression::fast());
                encoder
                    .write_all(&tile.to_packed())
                    .map_err(|e| CodecError::Deflate(e.to_string()))?;
                encoder
                    .finish()
                    .map_err(|e| CodecError::Deflate(e.to_string()))
            }
            TileEncoding::Snappy => snap::raw::Encoder::new()
                .compress_vec(&tile.to_packed())
                .map_err(|e| CodecError::Snappy(e.to_string())),
            TileEncoding::Gzip => {
                let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
                encoder
                    .write_all(&tile.to_packed())
                    .map_err(|e| CodecError::Gzip(e.to_string()))?;
                encoder.finish().map_err(|e| CodecError::Gzip(e.to_string()))
            }
            TileEncoding::Lzw => weezl::encode::Encoder::new(BitOrder::Lsb, 8)
                .encode(&tile.to_packed())
                .map_err(|e| CodecError::Lzw(e.to_string())),
            TileEncoding::Lz4 => Ok(lz4_flex::block::compress(&tile.to_packed())),
        }
    }

    /// Decode a payload into a `width x height` tile.
    ///
    /// # Errors
    ///
    /// Fails if the payload is malformed for this encoding or does not decode
    /// to exactly `width * height` samples.
    pub fn decode(&self, payload: &[u8], width: u32, height: u32) -> Result<Raster, CodecError> {
        let expected = width as usize * height as usize;
        let samples = match self {
            TileEncoding::Png => return decode_png(payload, width, height),
            TileEncoding::Raw => payload.to_vec(),
            TileEncoding::Deflate => read_bounded(DeflateDecoder::new(payload), expected)
                .map_err(|e| CodecError::Deflate(e.to_string()))?,
            TileEncoding::Snappy => {
                let len = snap::raw::decompress_len(payload)
                    .map_err(|e| CodecError::Snappy(e.to_string()))?;
                if len != expected {
                    return Err(CodecError::SizeMismatch {
                        expected,
                        actual: len,
                    });
                }
                snap::raw::Decoder::new()
                    .decompress_vec(payload)
                    .map_err(|e| CodecError::Snappy(e.to_string()))?
            }
            TileEncoding::Gzip => read_bounded(GzDecoder::new(payload), expected)
                .map_err(|e| CodecError::Gzip(e.to_string()))?,
            TileEncoding::Lzw => decode_lzw(payload, expected)?,
            TileEncoding::Lz4 => {
                let mut out = vec![0; expected];
                let len = lz4_flex::block::decompress_into(payload, &mut out)
                    .map_err(|e| CodecError::Lz4(e.to_string()))?;
                out.truncate(len);
                out
            }
        };

        if samples.len() != expected {
            return Err(CodecError::SizeMismatch {
                expected,
                actual: samples.len(),
            });
        }
        Raster::from_vec(width, height, samples).map_err(|_| CodecError::SizeMismatch {
            expected,
            actual: expected,
        })
    }
}

impl fmt::Display for TileEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TileEncoding::Png => "image",
            TileEncoding::Raw => "raw",
            TileEncoding::Deflate => "entropy-coded",
            TileEncoding::Snappy => "block-compressed",
            TileEncoding::Gzip => "gzip",
            TileEncoding::Lzw => "lzw",
            TileEncoding::Lz4 => "lz4",
        };
        f.write_str(name)
    }
}

/// Read at most `limit + 1` bytes from a decompressing reader.
fn read_bounded(reader: impl Read, limit: usize) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::with_capacity(limit);
    reader.take(limit as u64 + 1).read_to_end(&mut out)?;
    Ok(out)
}

/// Decode an LZW stream into at most `limit + 1` bytes.
fn decode_lzw(payload: &[u8], limit: usize) -> Result<Vec<u8>, CodecError> {
    let mut decoder = weezl::decode::Decoder::new(BitOrder::Lsb, 8);
    let mut out = vec![0; limit + 1];
    let mut input = payload;
    let mut written = 0;

    loop {
        let result = decoder.decode_bytes(input, &mut out[written..]);
        input = &input[result.consumed_in..];
        written += result.consumed_out;

        match result.status.map_err(|e| CodecError::Lzw(e.to_string()))? {
            LzwStatus::Done => break,
            LzwStatus::Ok if written == out.len() => break,
            LzwStatus::Ok if result.consumed_in > 0 || result.consumed_out > 0 => {}
            LzwStatus::Ok | LzwStatus::NoProgress => {
                return Err(CodecError::Lzw("truncated stream".to_string()))
            }
        }
    }

    out.truncate(written);
    Ok(out)
}

fn encode_png(tile: &Raster) -> Result<Vec<u8>, CodecError> {
    let img = GrayImage::from_raw(tile.width(), tile.height(), tile.to_packed()).ok_or(
        CodecError::SizeMismatch {
            expected: tile.len(),
            actual: tile.to_packed().len(),
        },
    )?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .map_err(|e| CodecError::Png(e.to_string()))?;
    Ok(out)
}

fn decode_png(payload: &[u8], width: u32, height: u32) -> Result<Raster, CodecError> {
    let img = ImageReader::with_format(Cursor::new(payload), ImageFormat::Png)
        .decode()
        .map_err(|e| CodecError::Png(e.to_string()))?;

    let gray = match img {
        DynamicImage::ImageLuma8(buf) => buf,
        other => {
            return Err(CodecError::Png(format!(
                "expected 8-bit greyscale tile, got {:?}",
                other.color()
            )))
        }
    };

    if gray.width() != width || gray.height() != height {
        return Err(CodecError::DimensionMismatch {
            width,
            height,
            actual_width: gray.width(),
            actual_height: gray.height(),
        });
    }

    let expected = width as usize * height as usize;
    Raster::from_vec(width, height, gray.into_raw()).map_err(|_| CodecError::SizeMismatch {
        expected,
        actual: expected,
    })
}

// =============================================================================
// Tests
// =============================================================================
