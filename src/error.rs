use thiserror::Error;

/// I/O errors that can occur when talking to a storage backend
#[derive(Debug, Clone, Error)]
pub enum IoError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object or file not found
    #[error("Object not found: {0}")]
    NotFound(String),

    /// Local filesystem failure
    #[error("File error at {path}: {message}")]
    File { path: String, message: String },
}

/// Errors produced while encoding or decoding a tile payload
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    /// PNG container could not be written or read
    #[error("PNG codec error: {0}")]
    Png(String),

    /// DEFLATE stream could not be written or read
    #[error("Deflate codec error: {0}")]
    Deflate(String),

    /// Snappy block could not be compressed or decompressed
    #[error("Snappy codec error: {0}")]
    Snappy(String),

    /// gzip member could not be written or read
    #[error("Gzip codec error: {0}")]
    Gzip(String),

    /// LZW stream could not be written or read
    #[error("LZW codec error: {0}")]
    Lzw(String),

    /// LZ4 block could not be decompressed
    #[error("LZ4 codec error: {0}")]
    Lz4(String),

    /// Decoded payload does not have the expected number of samples
    #[error("Decoded size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Decoded samples differ from the samples that were encoded
    #[error("{0} payload did not decode to the original samples")]
    RoundTrip(String),

    /// Decoded image has unexpected dimensions
    #[error("Decoded dimensions {actual_width}x{actual_height} do not match expected {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },
}

/// Errors for malformed raster buffers and rectangles
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    /// Sample buffer length does not match `width * height * channels`
    #[error("Raster buffer size mismatch: expected {expected} bytes, got {actual}")]
    BufferSize { expected: usize, actual: usize },

    /// Requested channel count is not usable for the operation
    #[error("Invalid channel count: raster has {channels}, requested {requested}")]
    ChannelCount { channels: usize, requested: usize },

    /// Rectangle does not fit inside the raster
    #[error("Rectangle {x},{y} {width}x{height} exceeds raster {raster_width}x{raster_height}")]
    RectOutOfBounds {
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        raster_width: u32,
        raster_height: u32,
    },
}

/// Errors returned by tile store backends
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// No payload is stored under the tile's key
    #[error("Tile not found: {key}")]
    NotFound { key: String },

    /// Stored payload could not be decoded to the expected tile
    #[error("Failed to decode tile {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Payload could not be encoded before writing
    #[error("Failed to encode tile {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Writing the payload failed
    #[error("Failed to write tile {key}: {source}")]
    Write {
        key: String,
        #[source]
        source: IoError,
    },

    /// Backend failure while reading
    #[error("Backend error: {0}")]
    Backend(#[from] IoError),
}

/// Errors that abort a reconstruction call
#[derive(Debug, Clone, Error)]
pub enum MosaicError {
    /// Query window extends beyond the raster
    #[error(
        "Window ({x0},{y0})-({x1},{y1}) is outside the raster bounds {width}x{height}"
    )]
    OutOfBounds {
        x0: i64,
        y0: i64,
        x1: i64,
        y1: i64,
        width: u32,
        height: u32,
    },

    /// Window has no pixels
    #[error("Window is empty")]
    EmptyWindow,

    /// Band index is not part of the grid
    #[error("Invalid band {band}: grid has {bands} band(s)")]
    InvalidBand { band: usize, bands: usize },

    /// Expected tile missing from the backend
    #[error("Tile not found: {key}")]
    TileNotFound { key: String },

    /// Stored tile payload is corrupt or has the wrong size
    #[error("Failed to decode tile {key}: {source}")]
    Decode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Tile could not be encoded for writing
    #[error("Failed to encode tile {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: CodecError,
    },

    /// Transient backend failure
    #[error("Backend error: {0}")]
    Backend(IoError),

    /// Fetched tile could not be placed on the canvas
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// Caller cancelled the call or its deadline elapsed
    #[error("Reconstruction cancelled")]
    Cancelled,

    /// A fetch task panicked or was aborted
    #[error("Tile fetch task failed: {0}")]
    TaskFailed(String),
}

impl From<StoreError> for MosaicError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { key } => MosaicError::TileNotFound { key },
            StoreError::Decode { key, source } => MosaicError::Decode { key, source },
            StoreError::Encode { key, source } => MosaicError::Encode { key, source },
            StoreError::Write { source, .. } => MosaicError::Backend(source),
            StoreError::Backend(io_err) => MosaicError::Backend(io_err),
        }
    }
}

/// Errors that abort a partition run
#[derive(Debug, Clone, Error)]
pub enum PartitionError {
    /// Source raster is malformed
    #[error("Raster error: {0}")]
    Raster(#[from] RasterError),

    /// Band raster does not match the grid's dimensions
    #[error("Band raster is {actual_width}x{actual_height}, grid expects {width}x{height}")]
    DimensionMismatch {
        width: u32,
        height: u32,
        actual_width: u32,
        actual_height: u32,
    },

    /// Number of band rasters does not match the grid's band list
    #[error("Expected {expected} band raster(s), got {actual}")]
    BandCount { expected: usize, actual: usize },

    /// Writing a tile failed; tiles written before it are left in place
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

}

/// Errors for grid layouts that cannot describe a tile grid
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// A dimension that must be positive is zero
    #[error("{0} must be greater than 0")]
    ZeroDimension(&'static str),

    /// The layout names no bands
    #[error("Grid layout must name at least one band")]
    NoBands,

    /// The layout names more bands than the source raster carries
    #[error("Grid layout names {bands} band(s) but the source has {source_bands}")]
    TooManyBands { bands: usize, source_bands: u32 },
}
