//! Checkpoint payload compression.
//!
//! Every scheme is a (compressor, decompressor) pair behind the [`Codec`]
//! trait, called with the same `(params, data)` signature whether it is a
//! built-in or caller-supplied. The scheme is chosen once through
//! [`CompressionParams::resolve`], which validates the parameters and
//! returns a [`ResolvedCodec`] used for the whole run.
//!
//! # Built-in Schemes
//!
//! | Scheme | Names | Error bound |
//! |--------|-------|-------------|
//! | [`Scheme::None`] | `none`, `null` | exact (identity) |
//! | [`Scheme::Zstd`] | `zstd`, `lossless`, `blosc` | exact |
//! | [`Scheme::Quantize`] | `quantize`, `lossy`, `zfp` | `tolerance` |
//! | [`Scheme::Custom`] | `custom` | defined by the codec |
//!
//! # Example
//!
//! ```
//! use revolve_engine::compression::{Codec, CompressionParams, Scheme};
//! use revolve_engine::Field;
//!
//! let params = CompressionParams::new(Scheme::Quantize).with_tolerance(1e-6);
//! let codec = params.resolve().unwrap();
//!
//! let field = Field::filled(vec![4, 4], 3.25);
//! let payload = codec.compress(&params, &field).unwrap();
//! let restored = codec.decompress(&params, &payload).unwrap();
//! assert!(restored.max_abs_diff(&field).unwrap() <= 1e-6);
//! ```

mod error;
mod lossless;
mod quantize;
mod wire;

pub use error::{CompressionError, CompressionResult};
pub use lossless::ZstdCodec;
pub use quantize::QuantizeCodec;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Deserialize;

use crate::field::Field;

/// Default absolute error bound of [`Scheme::Quantize`].
pub const DEFAULT_TOLERANCE: f64 = 1e-7;

/// Default zstd compression level.
pub const DEFAULT_LEVEL: i32 = 3;

/// Compression scheme selector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum Scheme {
    /// Identity: payload holds the field unchanged.
    #[default]
    None,
    /// General-purpose lossless byte compression (zstd).
    Zstd,
    /// Floating-point quantisation bounded by `tolerance`, then zstd.
    Quantize,
    /// Caller-supplied codec.
    Custom,
}

impl Scheme {
    /// Schemes available without caller-supplied code.
    pub const BUILTIN: [Scheme; 3] = [Scheme::None, Scheme::Zstd, Scheme::Quantize];

    /// Canonical name of the scheme.
    pub fn name(&self) -> &'static str {
        match self {
            Scheme::None => "none",
            Scheme::Zstd => "zstd",
            Scheme::Quantize => "quantize",
            Scheme::Custom => "custom",
        }
    }

    /// Returns true if the scheme reproduces fields exactly.
    ///
    /// `Custom` is reported as lossy since nothing is known about it.
    pub fn is_lossless(&self) -> bool {
        matches!(self, Scheme::None | Scheme::Zstd)
    }
}

impl FromStr for Scheme {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "null" | "" => Ok(Scheme::None),
            "zstd" | "lossless" | "blosc" => Ok(Scheme::Zstd),
            "quantize" | "lossy" | "zfp" => Ok(Scheme::Quantize),
            "custom" => Ok(Scheme::Custom),
            _ => Err(CompressionError::UnknownScheme(s.to_string())),
        }
    }
}

impl TryFrom<String> for Scheme {
    type Error = CompressionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Encoded content of a checkpoint slot.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Field stored as-is.
    Raw(Field),
    /// Byte stream produced by a byte codec.
    Encoded(Vec<u8>),
}

impl Payload {
    /// Bytes occupied by the payload.
    pub fn size_bytes(&self) -> usize {
        match self {
            Payload::Raw(field) => field.memory_size(),
            Payload::Encoded(bytes) => bytes.len(),
        }
    }

    /// Variant name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Payload::Raw(_) => "raw",
            Payload::Encoded(_) => "encoded",
        }
    }
}

/// A (compressor, decompressor) pair.
///
/// Implementations must round-trip any field within their stated error
/// bound. They are shared immutably, hence `Send + Sync`.
pub trait Codec: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        "custom"
    }

    /// Encodes a field.
    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload>;

    /// Decodes a payload produced by [`compress`](Codec::compress).
    fn decompress(&self, params: &CompressionParams, payload: &Payload) -> CompressionResult<Field>;
}

/// Identity codec: stores the field unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NoCompression;

impl Codec for NoCompression {
    fn name(&self) -> &str {
        "none"
    }

    fn compress(&self, _params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        Ok(Payload::Raw(field.clone()))
    }

    fn decompress(&self, _params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        match payload {
            Payload::Raw(field) => Ok(field.clone()),
            Payload::Encoded(_) => Err(CompressionError::Unsupported {
                codec: "none",
                payload: payload.kind(),
            }),
        }
    }
}

/// Codec assembled from two closures.
///
/// # Examples
///
/// ```
/// use revolve_engine::compression::{
///     Codec, CompressionParams, FnCodec, NoCompression, Payload,
/// };
/// use revolve_engine::Field;
///
/// let codec = FnCodec::new(
///     |params: &CompressionParams, field: &Field| NoCompression.compress(params, field),
///     |params: &CompressionParams, payload: &Payload| NoCompression.decompress(params, payload),
/// );
/// let params = CompressionParams::custom(codec);
/// assert!(params.resolve().is_ok());
/// ```
pub struct FnCodec<C, D> {
    compress: C,
    decompress: D,
}

impl<C, D> FnCodec<C, D>
where
    C: Fn(&CompressionParams, &Field) -> CompressionResult<Payload> + Send + Sync,
    D: Fn(&CompressionParams, &Payload) -> CompressionResult<Field> + Send + Sync,
{
    /// Creates a codec from a compressor and a decompressor.
    pub fn new(compress: C, decompress: D) -> Self {
        Self {
            compress,
            decompress,
        }
    }
}

impl<C, D> Codec for FnCodec<C, D>
where
    C: Fn(&CompressionParams, &Field) -> CompressionResult<Payload> + Send + Sync,
    D: Fn(&CompressionParams, &Payload) -> CompressionResult<Field> + Send + Sync,
{
    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        (self.compress)(params, field)
    }

    fn decompress(&self, params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        (self.decompress)(params, payload)
    }
}

/// Compression configuration, fixed for the lifetime of a run.
///
/// # Default Values
///
/// | Parameter | Default | Description |
/// |-----------|---------|-------------|
/// | `scheme` | `None` | Codec selector |
/// | `tolerance` | 1e-7 | Absolute error bound of `Quantize` |
/// | `level` | 3 | zstd level of `Zstd` and `Quantize` |
#[derive(Clone)]
pub struct CompressionParams {
    /// Codec selector.
    pub scheme: Scheme,

    /// Absolute error bound of the lossy scheme.
    pub tolerance: f64,

    /// zstd compression level.
    pub level: i32,

    /// Codec used by [`Scheme::Custom`].
    pub custom: Option<Arc<dyn Codec>>,
}

impl Default for CompressionParams {
    fn default() -> Self {
        Self {
            scheme: Scheme::None,
            tolerance: DEFAULT_TOLERANCE,
            level: DEFAULT_LEVEL,
            custom: None,
        }
    }
}

impl fmt::Debug for CompressionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompressionParams")
            .field("scheme", &self.scheme)
            .field("tolerance", &self.tolerance)
            .field("level", &self.level)
            .field("custom", &self.custom.as_ref().map(|codec| codec.name().to_string()))
            .finish()
    }
}

impl CompressionParams {
    /// Creates parameters for a built-in scheme with default tuning.
    pub fn new(scheme: Scheme) -> Self {
        Self {
            scheme,
            ..Self::default()
        }
    }

    /// Parameters for the identity codec.
    pub fn none() -> Self {
        Self::default()
    }

    /// Parameters for a caller-supplied codec.
    pub fn custom<C: Codec + 'static>(codec: C) -> Self {
        Self::custom_shared(Arc::new(codec))
    }

    /// Parameters for a caller-supplied codec that is already shared.
    pub fn custom_shared(codec: Arc<dyn Codec>) -> Self {
        Self {
            scheme: Scheme::Custom,
            custom: Some(codec),
            ..Self::default()
        }
    }

    /// Sets the error bound of the lossy scheme.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Sets the zstd level.
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    /// Validates the parameters.
    pub fn validate(&self) -> CompressionResult<()> {
        match self.scheme {
            Scheme::Custom if self.custom.is_none() => {
                return Err(CompressionError::MissingCustomCodec)
            }
            Scheme::Quantize if !(self.tolerance.is_finite() && self.tolerance > 0.0) => {
                return Err(CompressionError::InvalidTolerance(self.tolerance))
            }
            _ => {}
        }
        if matches!(self.scheme, Scheme::Zstd | Scheme::Quantize) {
            let range = zstd::compression_level_range();
            if !range.contains(&self.level) {
                return Err(CompressionError::InvalidLevel {
                    level: self.level,
                    min: *range.start(),
                    max: *range.end(),
                });
            }
        }
        Ok(())
    }

    /// Validates the parameters and selects the codec.
    pub fn resolve(&self) -> CompressionResult<ResolvedCodec> {
        self.validate()?;
        Ok(match self.scheme {
            Scheme::None => ResolvedCodec::None(NoCompression),
            Scheme::Zstd => ResolvedCodec::Zstd(ZstdCodec),
            Scheme::Quantize => ResolvedCodec::Quantize(QuantizeCodec),
            Scheme::Custom => match &self.custom {
                Some(codec) => ResolvedCodec::Custom(Arc::clone(codec)),
                None => return Err(CompressionError::MissingCustomCodec),
            },
        })
    }
}

/// Codec selected by [`CompressionParams::resolve`].
#[derive(Clone)]
pub enum ResolvedCodec {
    /// Identity codec
    None(NoCompression),
    /// Lossless zstd codec
    Zstd(ZstdCodec),
    /// Error-bounded lossy codec
    Quantize(QuantizeCodec),
    /// Caller-supplied codec
    Custom(Arc<dyn Codec>),
}

impl ResolvedCodec {
    /// Scheme the codec was resolved from.
    pub fn scheme(&self) -> Scheme {
        match self {
            ResolvedCodec::None(_) => Scheme::None,
            ResolvedCodec::Zstd(_) => Scheme::Zstd,
            ResolvedCodec::Quantize(_) => Scheme::Quantize,
            ResolvedCodec::Custom(_) => Scheme::Custom,
        }
    }
}

impl fmt::Debug for ResolvedCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ResolvedCodec({})", self.name())
    }
}

impl Codec for ResolvedCodec {
    fn name(&self) -> &str {
        match self {
            ResolvedCodec::None(codec) => codec.name(),
            ResolvedCodec::Zstd(codec) => codec.name(),
            ResolvedCodec::Quantize(codec) => codec.name(),
            ResolvedCodec::Custom(codec) => codec.name(),
        }
    }

    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        match self {
            ResolvedCodec::None(codec) => codec.compress(params, field),
            ResolvedCodec::Zstd(codec) => codec.compress(params, field),
            ResolvedCodec::Quantize(codec) => codec.compress(params, field),
            ResolvedCodec::Custom(codec) => codec.compress(params, field),
        }
    }

    fn decompress(&self, params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        match self {
            ResolvedCodec::None(codec) => codec.decompress(params, payload),
            ResolvedCodec::Zstd(codec) => codec.decompress(params, payload),
            ResolvedCodec::Quantize(codec) => codec.decompress(params, payload),
            ResolvedCodec::Custom(codec) => codec.decompress(params, payload),
        }
    }
}
