//! Query windows and tile range resolution.
//!
//! [`resolve`] turns a window in global pixel space into the inclusive range of
//! tile rows/columns it overlaps, plus one [`TilePlacement`] per overlapped
//! tile describing which sub-rectangle of the tile to copy and where it lands
//! on the output canvas.
//!
//! Placements are produced row-major. The destination cursor advances by the
//! exact clipped width/height of each tile, so the fragments tile the canvas
//! with no gaps and no overlaps.

use std::ops::RangeInclusive;

use crate::error::MosaicError;

use super::layout::{GridLayout, TileKey};

// =============================================================================
// Window
// =============================================================================

/// A rectangular query region in global pixel coordinates.
///
/// The origin may be negative; such windows fail resolution with
/// [`MosaicError::OutOfBounds`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    x0: i64,
    y0: i64,
    width: u32,
    height: u32,
}

impl Window {
    /// Square window around a center pixel.
    ///
    /// Covers `(cx - h, cy - h)` to `(cx + h - 1, cy + h - 1)` inclusive, so
    /// the canvas is `2h x 2h`.
    ///
    /// Extents too large for `u32` and centers near the `i64` limits
    /// saturate; such windows can never fit a raster and fail resolution.
    pub fn centered(cx: i64, cy: i64, half_extent: u32) -> Self {
        let h = i64::from(half_extent);
        let size = half_extent.saturating_mul(2);
        Self {
            x0: cx.saturating_sub(h),
            y0: cy.saturating_sub(h),
            width: size,
            height: size,
        }
    }

    /// Window between two inclusive corners.
    pub fn from_corners(x0: i64, y0: i64, x1: i64, y1: i64) -> Result<Self, MosaicError> {
        if x1 < x0 || y1 < y0 {
            return Err(MosaicError::EmptyWindow);
        }
        let span = |lo: i64, hi: i64| {
            hi.checked_sub(lo)
                .and_then(|d| d.checked_add(1))
                .and_then(|n| u32::try_from(n).ok())
                .ok_or(MosaicError::OutOfBounds {
                    x0,
                    y0,
                    x1,
                    y1,
                    width: u32::MAX,
                    height: u32::MAX,
                })
        };
        let width = span(x0, x1)?;
        let height = span(y0, y1)?;
        Ok(Self {
            x0,
            y0,
            width,
            height,
        })
    }

    /// Window covering an entire layout.
    pub fn full(layout: &GridLayout) -> Self {
        Self {
            x0: 0,
            y0: 0,
            width: layout.width(),
            height: layout.height(),
        }
    }

    pub fn x0(&self) -> i64 {
        self.x0
    }

    pub fn y0(&self) -> i64 {
        self.y0
    }

    /// Last column covered (inclusive).
    pub fn x1(&self) -> i64 {
        self.x0.saturating_add(i64::from(self.width) - 1)
    }

    /// Last row covered (inclusive).
    pub fn y1(&self) -> i64 {
        self.y0.saturating_add(i64::from(self.height) - 1)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

// =============================================================================
// Resolution Output
// =============================================================================

/// Sub-rectangle of a tile, in tile-local pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One overlapped tile: what to copy out of it and where to put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TilePlacement {
    pub row: u32,
    pub col: u32,

    /// Region of the tile that falls inside the window
    pub clip: ClipRect,

    /// Canvas column of the clip's top-left corner
    pub dst_x: u32,

    /// Canvas row of the clip's top-left corner
    pub dst_y: u32,
}

impl TilePlacement {
    /// Storage key of this tile for a band.
    pub fn key(&self, band: usize) -> TileKey {
        TileKey::new(self.row, self.col, band)
    }
}

/// Tiles overlapping a window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileRange {
    pub rows: RangeInclusive<u32>,
    pub cols: RangeInclusive<u32>,

    /// Placements in row-major order
    pub placements: Vec<TilePlacement>,

    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl TileRange {
    pub fn tile_count(&self) -> usize {
        self.placements.len()
    }
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolve the tiles a window overlaps and their per-tile clip rectangles.
///
/// # Errors
///
/// - [`MosaicError::EmptyWindow`] if the window has no pixels
/// - [`MosaicError::OutOfBounds`] if any part of the window lies outside the
///   raster; the window is never clamped
pub fn resolve(layout: &GridLayout, window: &Window) -> Result<TileRange, MosaicError> {
    if window.is_empty() {
        return Err(MosaicError::EmptyWindow);
    }

    let (x0, y0, x1, y1) = (window.x0(), window.y0(), window.x1(), window.y1());
    if x0 < 0 || y0 < 0 || x1 >= layout.width() as i64 || y1 >= layout.height() as i64 {
        return Err(MosaicError::OutOfBounds {
            x0,
            y0,
            x1,
            y1,
            width: layout.width(),
            height: layout.height(),
        });
    }

    // Bounds are checked, so all corners fit in u32.
    let (x0, y0, x1, y1) = (x0 as u32, y0 as u32, x1 as u32, y1 as u32);
    let t = layout.tile_size();

    let col0 = x0 / t;
    let col1 = x1 / t;
    let row0 = y0 / t;
    let row1 = y1 / t;

    let mut placements =
        Vec::with_capacity(((row1 - row0 + 1) * (col1 - col0 + 1)) as usize);

    let mut dst_y = 0;
    for row in row0..=row1 {
        let clip_y0 = if row == row0 { y0 % t } else { 0 };
        let clip_y1 = if row == row1 { y1 % t + 1 } else { t };

        let mut dst_x = 0;
        for col in col0..=col1 {
            let clip_x0 = if col == col0 { x0 % t } else { 0 };
            let clip_x1 = if col == col1 { x1 % t + 1 } else { t };

            placements.push(TilePlacement {
                row,
                col,
                clip: ClipRect {
                    x: clip_x0,
                    y: clip_y0,
                    width: clip_x1 - clip_x0,
                    height: clip_y1 - clip_y0,
                },
                dst_x,
                dst_y,
            });
            dst_x += clip_x1 - clip_x0;
        }
        debug_assert_eq!(dst_x, window.width());
        dst_y += clip_y1 - clip_y0;
    }
    debug_assert_eq!(dst_y, window.height());

    Ok(TileRange {
        rows: row0..=row1,
        cols: col0..=col1,
        placements,
        canvas_width: window.width(),
        canvas_height: window.height(),
    })
}

// =============================================================================
// Tests
// =============================================================================
