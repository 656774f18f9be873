//! Side-by-side comparison of tile encodings.
//!
//! Encodes one band with each encoding, decodes it again, and reports payload
//! size and timings. Used to pick a storage encoding for a dataset.

use std::time::{Duration, Instant};

use serde::Serialize;

use crate::error::CodecError;
use crate::raster::Raster;

use super::codec::TileEncoding;

/// Result of encoding and decoding one raster with one encoding.
#[derive(Debug, Clone, Serialize)]
pub struct CodecReport {
    pub encoding: TileEncoding,

    /// Size of the unencoded samples
    pub raw_bytes: usize,

    /// Size of the encoded payload
    pub payload_bytes: usize,

    /// `payload_bytes / raw_bytes`
    pub ratio: f64,

    #[serde(serialize_with = "as_millis")]
    pub encode_time: Duration,

    #[serde(serialize_with = "as_millis")]
    pub decode_time: Duration,
}

/// Encode and decode `band` with every encoding in `encodings`.
///
/// Fails on the first encoding whose payload does not decode back to the
/// original samples.
pub fn compare_encodings(
    band: &Raster,
    encodings: &[TileEncoding],
) -> Result<Vec<CodecReport>, CodecError> {
    let raw_bytes = band.len();
    let mut reports = Vec::with_capacity(encodings.len());

    for &encoding in encodings {
        let start = Instant::now();
        let payload = encoding.encode(band)?;
        let encode_time = start.elapsed();

        let start = Instant::now();
        let decoded = encoding.decode(&payload, band.width(), band.height())?;
        let decode_time = start.elapsed();

        if decoded.to_packed() != band.to_packed() {
            return Err(CodecError::RoundTrip(encoding.to_string()));
        }

        tracing::debug!(
            %encoding,
            payload_bytes = payload.len(),
            ?encode_time,
            ?decode_time,
            "Compared encoding"
        );

        reports.push(CodecReport {
            encoding,
            raw_bytes,
            payload_bytes: payload.len(),
            ratio: if raw_bytes == 0 {
                0.0
            } else {
                payload.len() as f64 / raw_bytes as f64
            },
            encode_time,
            decode_time,
        });
    }

    Ok(reports)
}

fn as_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64(d.as_secs_f64() * 1000.0)
}
