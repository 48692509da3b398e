//! Little-endian framing shared by the byte codecs.
//!
//! Every encoded payload starts with a one-byte format tag followed by the
//! field shape (`u32` rank, then one `u64` per dimension).

use super::error::{CompressionError, CompressionResult};

/// Lossless `f64` body.
pub(crate) const TAG_RAW: u8 = 0x01;
/// Quantised integer body.
pub(crate) const TAG_QUANTIZED: u8 = 0x02;

pub(crate) fn write_header(buf: &mut Vec<u8>, tag: u8, shape: &[usize]) {
    buf.push(tag);
    buf.extend_from_slice(&(shape.len() as u32).to_le_bytes());
    for &dim in shape {
        buf.extend_from_slice(&(dim as u64).to_le_bytes());
    }
}

pub(crate) fn write_f64s(buf: &mut Vec<u8>, values: &[f64]) {
    buf.reserve(values.len() * 8);
    for value in values {
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

/// LEB128 encoding of an unsigned integer.
pub(crate) fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

#[inline]
pub(crate) fn zigzag(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

#[inline]
pub(crate) fn unzigzag(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Cursor over an encoded payload.
pub(crate) struct Reader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    fn take(&mut self, n: usize) -> CompressionResult<&'a [u8]> {
        if self.remaining() < n {
            return Err(CompressionError::Corrupt(format!(
                "truncated payload: needed {} bytes at offset {}, {} left",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub(crate) fn read_u8(&mut self) -> CompressionResult<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn read_u32(&mut self) -> CompressionResult<u32> {
        let mut raw = [0u8; 4];
        raw.copy_from_slice(self.take(4)?);
        Ok(u32::from_le_bytes(raw))
    }

    pub(crate) fn read_u64(&mut self) -> CompressionResult<u64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(u64::from_le_bytes(raw))
    }

    pub(crate) fn read_f64(&mut self) -> CompressionResult<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    pub(crate) fn read_varint(&mut self) -> CompressionResult<u64> {
        let mut value = 0u64;
        let mut shift = 0u32;
        loop {
            let byte = self.read_u8()?;
            if shift >= 64 {
                return Err(CompressionError::Corrupt("varint too long".to_string()));
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    /// Reads the format tag and shape.
    pub(crate) fn read_header(&mut self) -> CompressionResult<(u8, Vec<usize>)> {
        let tag = self.read_u8()?;
        let rank = self.read_u32()? as usize;
        if rank > self.remaining() / 8 {
            return Err(CompressionError::Corrupt(format!("implausible rank {}", rank)));
        }
        let shape = (0..rank)
            .map(|_| {
                let dim = self.read_u64()?;
                usize::try_from(dim)
                    .map_err(|_| CompressionError::Corrupt(format!("dimension {} too large", dim)))
            })
            .collect::<CompressionResult<Vec<_>>>()?;
        Ok((tag, shape))
    }

    /// Reads `count` little-endian `f64` values.
    pub(crate) fn read_f64s(&mut self, count: usize) -> CompressionResult<Vec<f64>> {
        if count.checked_mul(8).map_or(true, |n| n > self.remaining()) {
            return Err(CompressionError::Corrupt(format!(
                "payload holds {} bytes, {} values expected",
                self.remaining(),
                count
            )));
        }
        (0..count).map(|_| self.read_f64()).collect()
    }

    /// Fails if bytes are left over.
    pub(crate) fn finish(self) -> CompressionResult<()> {
        if self.remaining() != 0 {
            return Err(CompressionError::Corrupt(format!(
                "{} trailing bytes",
                self.remaining()
            )));
        }
        Ok(())
    }
}
