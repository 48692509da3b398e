//! Errors raised while configuring or running a codec.

use thiserror::Error;

/// Errors that can occur during checkpoint compression.
#[derive(Debug, Error)]
pub enum CompressionError {
    /// Scheme name not recognised.
    #[error("Unknown compression scheme '{0}'. Supported: none, zstd, quantize, custom")]
    UnknownScheme(String),

    /// `custom` scheme selected without a codec.
    #[error("Compression scheme 'custom' requires a compressor/decompressor pair")]
    MissingCustomCodec,

    /// Error tolerance of the lossy scheme is not usable.
    #[error("Invalid tolerance {0}: must be finite and positive")]
    InvalidTolerance(f64),

    /// Compression level outside the range supported by zstd.
    #[error("Invalid compression level {level}: must be in [{min}, {max}]")]
    InvalidLevel {
        /// Requested level
        level: i32,
        /// Smallest supported level
        min: i32,
        /// Largest supported level
        max: i32,
    },

    /// The underlying byte compressor failed.
    #[error("Codec I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoded payload could not be decoded.
    #[error("Corrupt payload: {0}")]
    Corrupt(String),

    /// Shape does not describe the number of values.
    #[error("Shape {shape:?} does not describe {len} values")]
    ShapeMismatch {
        /// Declared shape
        shape: Vec<usize>,
        /// Number of values present
        len: usize,
    },

    /// Payload variant not produced by this codec.
    #[error("Codec '{codec}' cannot decode a {payload} payload")]
    Unsupported {
        /// Codec name
        codec: &'static str,
        /// Payload variant name
        payload: &'static str,
    },

    /// Error raised by a caller-supplied codec.
    #[error("Custom codec failed: {0}")]
    Custom(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CompressionError {
    /// Wraps an arbitrary error raised inside a custom codec.
    pub fn custom<E>(err: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        CompressionError::Custom(err.into())
    }
}

/// Result type for compression operations.
pub type CompressionResult<T> = Result<T, CompressionError>;
