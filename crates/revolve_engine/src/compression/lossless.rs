//! General-purpose lossless codec backed by zstd.

use super::error::{CompressionError, CompressionResult};
use super::wire::{write_f64s, write_header, Reader, TAG_RAW};
use super::{Codec, CompressionParams, Payload};
use crate::field::{element_count, Field};

/// Lossless codec: raw little-endian `f64` values compressed with zstd at
/// [`CompressionParams::level`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ZstdCodec;

impl Codec for ZstdCodec {
    fn name(&self) -> &str {
        "zstd"
    }

    fn compress(&self, params: &CompressionParams, field: &Field) -> CompressionResult<Payload> {
        let mut buf = Vec::with_capacity(field.memory_size() + 16);
        write_header(&mut buf, TAG_RAW, field.shape());
        write_f64s(&mut buf, field.values());
        Ok(Payload::Encoded(zstd::encode_all(&buf[..], params.level)?))
    }

    fn decompress(&self, _params: &CompressionParams, payload: &Payload) -> CompressionResult<Field> {
        let bytes = match payload {
            Payload::Encoded(bytes) => bytes,
            Payload::Raw(_) => {
                return Err(CompressionError::Unsupported {
                    codec: "zstd",
                    payload: payload.kind(),
                })
            }
        };
        let buf = zstd::decode_all(&bytes[..])?;
        decode_raw_body(&buf, TAG_RAW)
    }
}

/// Decodes a `TAG_RAW` frame: header followed by `f64` values.
pub(crate) fn decode_raw_body(buf: &[u8], expected_tag: u8) -> CompressionResult<Field> {
    let mut reader = Reader::new(buf);
    let (tag, shape) = reader.read_header()?;
    if tag != expected_tag {
        return Err(CompressionError::Corrupt(format!(
            "unexpected format tag {:#04x}",
            tag
        )));
    }
    read_raw_values(reader, shape)
}

/// Reads the `f64` body following a header.
pub(crate) fn read_raw_values(mut reader: Reader<'_>, shape: Vec<usize>) -> CompressionResult<Field> {
    let count = element_count(&shape)
        .ok_or_else(|| CompressionError::Corrupt(format!("shape {:?} overflows", shape)))?;
    let values = reader.read_f64s(count)?;
    reader.finish()?;
    Field::new(shape, values)
}
