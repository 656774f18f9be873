//! PNG input and output for whole rasters.
//!
//! Source images are loaded as [`InterleavedRaster`]s with their native channel
//! count (grey, grey+alpha, RGB or RGBA; 16-bit images are reduced to 8-bit
//! RGBA). Reconstructed canvases are written as 8-bit greyscale PNGs.

use std::io::Cursor;
use std::path::Path;

use image::{DynamicImage, GrayImage, ImageFormat, ImageReader};

use crate::error::CodecError;

use super::{InterleavedRaster, Raster};

/// Decode an in-memory PNG into an interleaved raster.
pub fn decode_png(bytes: &[u8]) -> Result<InterleavedRaster, CodecError> {
    let img = ImageReader::with_format(Cursor::new(bytes), ImageFormat::Png)
        .decode()
        .map_err(|e| CodecError::Png(e.to_string()))?;
    from_dynamic(img)
}

/// Read and decode a PNG file.
pub fn load_png(path: impl AsRef<Path>) -> Result<InterleavedRaster, CodecError> {
    let path = path.as_ref();
    let bytes =
        std::fs::read(path).map_err(|e| CodecError::Png(format!("{}: {}", path.display(), e)))?;
    decode_png(&bytes)
}

/// Write a single-band raster as an 8-bit greyscale PNG.
pub fn save_png(raster: &Raster, path: impl AsRef<Path>) -> Result<(), CodecError> {
    let path = path.as_ref();
    let img = GrayImage::from_raw(raster.width(), raster.height(), raster.to_packed()).ok_or(
        CodecError::SizeMismatch {
            expected: raster.len(),
            actual: raster.to_packed().len(),
        },
    )?;
    img.save_with_format(path, ImageFormat::Png)
        .map_err(|e| CodecError::Png(format!("{}: {}", path.display(), e)))
}

fn from_dynamic(img: DynamicImage) -> Result<InterleavedRaster, CodecError> {
    let (width, height) = (img.width(), img.height());
    let (channels, data) = match img {
        DynamicImage::ImageLuma8(buf) => (1, buf.into_raw()),
        DynamicImage::ImageLumaA8(buf) => (2, buf.into_raw()),
        DynamicImage::ImageRgb8(buf) => (3, buf.into_raw()),
        DynamicImage::ImageRgba8(buf) => (4, buf.into_raw()),
        other => (4, other.to_rgba8().into_raw()),
    };
    InterleavedRaster::new(width, height, channels, data).map_err(|e| CodecError::Png(e.to_string()))
}
