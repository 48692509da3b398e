//! Error-bounded lossy codec for floating-point fields.
//!
//! Values are mapped to integers `q = round(v / (2·tol))`, and every
//! reconstruction `q · 2·tol` is checked to lie within `tol` of the original.
//! Consecutive integers are delta encoded, zigzag
//! mapped and written as LEB128 varints before the whole frame is passed
//! through zstd. Smooth fields therefore shrink to a few bits per value.

use tracing::warn;

use super::error::{CompressionError, CompressionResult};
use super::lossless::read_raw_values;
use super::wire::{
    unzigzag, write_f64s, write_header, write_varint, zigzag, Reader, TAG_QUANTIZED, TAG_RAW,
};
use super::{Codec, CompressionParams, Payload};
use crate::field::{element_count, Field};

/// Largest quantised magnitude; integers beyond 2^53 lose precision as `f64`.
const MAX_QUANT: f64 = 9_007_199_254_740_992.0;

/// Lossy codec bounded by [`CompressionParams::tolerance`].
///
/// Fields containing non-finite values, or values whose reconstruction
/// misses the tolerance (e.g. when `tol` is below one ulp of the value), are
/// stored losslessly instead.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QuantizeCodec;

#[inline]
fn quantize(value: f64, step: f64, tolerance: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let q = (value / step).round();
    if q.abs() > MAX_QUANT {
        return None;
    }
    let q = q as i64;
    // Must match the reconstruction in `decompress` bit for bit.
    if (q as f64 * step - value).abs() > tolerance {
        return None;
    }
    Some(q)
}

impl Codec for QuantizeCodec {
    fn name(&self) -> &str {
        "quantize"
    }

    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        if !(params.tolerance.is_finite() && params.tolerance > 0.0) {
            return Err(CompressionError::InvalidTolerance(params.tolerance));
        }
        let step = 2.0 * params.tolerance;
        let quantized: Option<Vec<i64>> = field
            .values()
            .iter()
            .map(|&v| quantize(v, step, params.tolerance))
            .collect();

        let mut buf = Vec::with_capacity(field.len() * 2 + 32);
        match quantized {
            Some(ints) => {
                write_header(&mut buf, TAG_QUANTIZED, field.shape());
                buf.extend_from_slice(&step.to_le_bytes());
                let mut previous = 0i64;
                for q in ints {
                    write_varint(&mut buf, zigzag(q.wrapping_sub(previous)));
                    previous = q;
                }
            }
            None => {
                warn!(
                    tolerance = params.tolerance,
                    len = field.len(),
                    "field not quantisable, storing losslessly"
                );
                write_header(&mut buf, TAG_RAW, field.shape());
                write_f64s(&mut buf, field.values());
            }
        }
        Ok(Payload::Encoded(zstd::encode_all(&buf[..], params.level)?))
    }

    fn decompress(&self, _params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        let bytes = match payload {
            Payload::Encoded(bytes) => bytes,
            Payload::Raw(_) => {
                return Err(CompressionError::Unsupported {
                    codec: "quantize",
                    payload: payload.kind(),
                })
            }
        };
        let buf = zstd::decode_all(&bytes[..])?;
        let mut reader = Reader::new(&buf);
        let (tag, shape) = reader.read_header()?;
        match tag {
            TAG_QUANTIZED => {
                let step = reader.read_f64()?;
                let count = element_count(&shape)
                    .ok_or_else(|| CompressionError::Corrupt(format!("shape {:?} overflows", shape)))?;
                // Every value takes at least one varint byte.
                if count > reader.remaining() {
                    return Err(CompressionError::Corrupt(format!(
                        "{} values announced, {} bytes present",
                        count,
                        reader.remaining()
                    )));
                }
                let mut values = Vec::with_capacity(count);
                let mut q = 0i64;
                for _ in 0..count {
                    q = q.wrapping_add(unzigzag(reader.read_varint()?));
                    values.push(q as f64 * step);
                }
                reader.finish()?;
                Field::new(shape, values)
            }
            TAG_RAW => read_raw_values(reader, shape),
            other => Err(CompressionError::Corrupt(format!(
                "unexpected format tag {:#04x}",
                other
            ))),
        }
    }
}
