//! Geographic to raster coordinate mapping.
//!
//! The raster is an equirectangular world image: column 0 is longitude -180,
//! row 0 is latitude +90, and pixels are square with `width / 360` pixels per
//! degree on both axes.

use clap::ValueEnum;

use super::layout::GridLayout;

/// Where rounding to an integer happens when mapping degrees to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PixelRounding {
    /// Round the shifted degree value, then scale by pixels-per-degree.
    ///
    /// Query points snap to whole degrees. Existing tile sets and their
    /// consumers assume this behavior.
    #[default]
    Degree,

    /// Scale first, then round the pixel coordinate.
    Pixel,
}

/// Maps latitude/longitude to global pixel and tile coordinates.
///
/// All rounding is to nearest with ties away from zero. Points outside
/// `[-90, 90] x [-180, 180]` are accepted and produce coordinates outside the
/// raster; window resolution rejects them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    pixels_per_degree: f64,
    tile_size: u32,
    rounding: PixelRounding,
}

impl CoordinateMapper {
    /// Create a mapper for the given layout using degree rounding.
    pub fn new(layout: &GridLayout) -> Self {
        Self {
            pixels_per_degree: layout.width() as f64 / 360.0,
            tile_size: layout.tile_size(),
            rounding: PixelRounding::Degree,
        }
    }

    /// Use a different rounding policy.
    pub fn with_rounding(mut self, rounding: PixelRounding) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn pixels_per_degree(&self) -> f64 {
        self.pixels_per_degree
    }

    pub fn rounding(&self) -> PixelRounding {
        self.rounding
    }

    /// Map a geographic coordinate to a global pixel coordinate `(x, y)`.
    pub fn to_global_pixel(&self, lat: f64, lon: f64) -> (i64, i64) {
        (self.scale(lon + 180.0), self.scale(90.0 - lat))
    }

    /// Tile `(row, col)` containing a global pixel, using floor division so
    /// negative pixels map to negative tiles.
    pub fn to_tile(&self, x: i64, y: i64) -> (i64, i64) {
        let t = self.tile_size as i64;
        (y.div_euclid(t), x.div_euclid(t))
    }

    fn scale(&self, degrees: f64) -> i64 {
        match self.rounding {
            PixelRounding::Degree => (degrees.round() * self.pixels_per_degree).round() as i64,
            PixelRounding::Pixel => (degrees * self.pixels_per_degree).round() as i64,
        }
    }
}
