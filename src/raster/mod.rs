//! In-memory raster buffers.
//!
//! [`Raster`] is the single byte-buffer-with-stride type used everywhere a
//! band of samples is held: decoded tiles (whatever their encoding), band
//! rasters produced at partition time, and reconstruction canvases.
//! [`InterleavedRaster`] holds a multi-channel source image before it is split
//! into bands.

mod image_io;
mod split;

pub use image_io::{decode_png, load_png, save_png};
pub use split::split_bands;

use crate::error::RasterError;
use crate::grid::ClipRect;

// =============================================================================
// Single-band Raster
// =============================================================================

/// A single-band 8-bit raster, row-major with an explicit row stride.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    stride: usize,
    data: Vec<u8>,
}

impl Raster {
    /// Zero-filled raster.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            stride: width as usize,
            data: vec![0; width as usize * height as usize],
        }
    }

    /// Wrap a packed buffer (`stride == width`).
    pub fn from_vec(width: u32, height: u32, data: Vec<u8>) -> Result<Self, RasterError> {
        Self::with_stride(width, height, width as usize, data)
    }

    /// Wrap a buffer whose rows are `stride` bytes apart.
    ///
    /// The final row only needs `width` bytes.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: usize,
        data: Vec<u8>,
    ) -> Result<Self, RasterError> {
        if stride < width as usize {
            return Err(RasterError::BufferSize {
                expected: width as usize,
                actual: stride,
            });
        }
        let expected = match height {
            0 => 0,
            h => stride * (h as usize - 1) + width as usize,
        };
        if data.len() < expected || (stride == width as usize && data.len() != expected) {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            stride,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of samples (`width * height`).
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sample at `(x, y)`, or `None` outside the raster.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y as usize * self.stride + x as usize).copied()
    }

    /// Samples of row `y`, without stride padding.
    ///
    /// # Panics
    /// Panics if `y >= height`.
    pub fn row(&self, y: u32) -> &[u8] {
        let start = y as usize * self.stride;
        &self.data[start..start + self.width as usize]
    }

    /// Packed samples, copying only when the stride has padding.
    pub fn to_packed(&self) -> Vec<u8> {
        if self.stride == self.width as usize {
            return self.data.clone();
        }
        let mut out = Vec::with_capacity(self.len());
        for y in 0..self.height {
            out.extend_from_slice(self.row(y));
        }
        out
    }

    /// Copy out a sub-rectangle as a new packed raster.
    pub fn crop(&self, x: u32, y: u32, width: u32, height: u32) -> Result<Raster, RasterError> {
        self.check_rect(x, y, width, height)?;
        let mut out = Raster::new(width, height);
        out.copy_rect(
            self,
            ClipRect {
                x,
                y,
                width,
                height,
            },
            0,
            0,
        )?;
        Ok(out)
    }

    /// Copy `clip` from `src` into this raster at `(dst_x, dst_y)`.
    ///
    /// Both the source rectangle and its destination must fit entirely;
    /// nothing is written otherwise.
    pub fn copy_rect(
        &mut self,
        src: &Raster,
        clip: ClipRect,
        dst_x: u32,
        dst_y: u32,
    ) -> Result<(), RasterError> {
        src.check_rect(clip.x, clip.y, clip.width, clip.height)?;
        self.check_rect(dst_x, dst_y, clip.width, clip.height)?;

        let w = clip.width as usize;
        for row in 0..clip.height {
            let s = (clip.y + row) as usize * src.stride + clip.x as usize;
            let d = (dst_y + row) as usize * self.stride + dst_x as usize;
            self.data[d..d + w].copy_from_slice(&src.data[s..s + w]);
        }
        Ok(())
    }

    fn check_rect(&self, x: u32, y: u32, width: u32, height: u32) -> Result<(), RasterError> {
        let fits_x = x.checked_add(width).is_some_and(|end| end <= self.width);
        let fits_y = y.checked_add(height).is_some_and(|end| end <= self.height);
        if fits_x && fits_y {
            Ok(())
        } else {
            Err(RasterError::RectOutOfBounds {
                x,
                y,
                width,
                height,
                raster_width: self.width,
                raster_height: self.height,
            })
        }
    }
}

// =============================================================================
// Interleaved Raster
// =============================================================================

/// A multi-channel raster with samples interleaved per pixel (e.g. RGBA).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterleavedRaster {
    width: u32,
    height: u32,
    channels: usize,
    data: Vec<u8>,
}

impl InterleavedRaster {
    /// Wrap an interleaved buffer of `width * height * channels` bytes.
    pub fn new(width: u32, height: u32, channels: usize, data: Vec<u8>) -> Result<Self, RasterError> {
        if channels == 0 {
            return Err(RasterError::ChannelCount {
                channels,
                requested: 1,
            });
        }
        let expected = width as usize * height as usize * channels;
        if data.len() != expected {
            return Err(RasterError::BufferSize {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            channels,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn channels(&self) -> usize {
        self.channels
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
