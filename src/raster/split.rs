use crate::error::RasterError;

use super::{InterleavedRaster, Raster};

/// Split an interleaved raster into its first `bands` channels.
///
/// Bands come back in channel order (band 0 is channel 0). Trailing channels
/// beyond `bands`, such as alpha, are dropped.
pub fn split_bands(raster: &InterleavedRaster, bands: usize) -> Result<Vec<Raster>, RasterError> {
    let channels = raster.channels();
    if bands == 0 || bands > channels {
        return Err(RasterError::ChannelCount {
            channels,
            requested: bands,
        });
    }

    let pixels = raster.width() as usize * raster.height() as usize;
    let mut planes: Vec<Vec<u8>> = (0..bands).map(|_| Vec::with_capacity(pixels)).collect();

    for pixel in raster.as_bytes().chunks_exact(channels) {
        for (plane, &sample) in planes.iter_mut().zip(pixel) {
            plane.push(sample);
        }
    }

    planes
        .into_iter()
        .map(|plane| Raster::from_vec(raster.width(), raster.height(), plane))
        .collect()
}
