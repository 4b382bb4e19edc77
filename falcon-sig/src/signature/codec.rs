//! Compressed encoding of signature polynomials (section 3.11.2 of the Falcon paper).
//!
//! Each coefficient `c` is written as:
//! 1. one sign bit (1 for negative);
//! 2. the 7 low bits of `|c|`, most significant first;
//! 3. `|c| >> 7` zero bits followed by a single one bit.
//!
//! Bits are packed MSB-first and the output is padded with zero bits to a fixed byte length.
//! Decoding is strict, so every accepted input is the unique encoding of its coefficients.

use alloc::{string::ToString, vec::Vec};

use crate::FalconError;

// BIT WRITER
// ================================================================================================

struct BitWriter {
    bytes: Vec<u8>,
    acc: u32,
    acc_len: u32,
    max_bytes: usize,
}

impl BitWriter {
    fn new(max_bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(max_bytes),
            acc: 0,
            acc_len: 0,
            max_bytes,
        }
    }

    /// Appends the `len <= 16` low bits of `value`.
    fn push(&mut self, value: u32, len: u32) -> Result<(), FalconError> {
        self.acc = (self.acc << len) | value;
        self.acc_len += len;
        while self.acc_len >= 8 {
            self.acc_len -= 8;
            self.emit((self.acc >> self.acc_len) as u8)?;
        }
        self.acc &= (1 << self.acc_len) - 1;
        Ok(())
    }

    fn emit(&mut self, byte: u8) -> Result<(), FalconError> {
        if self.bytes.len() == self.max_bytes {
            return Err(FalconError::EncodingOverflow { max_bytes: self.max_bytes });
        }
        self.bytes.push(byte);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<u8>, FalconError> {
        if self.acc_len > 0 {
            let byte = (self.acc << (8 - self.acc_len)) as u8;
            self.emit(byte)?;
        }
        self.bytes.resize(self.max_bytes, 0);
        Ok(self.bytes)
    }
}

// BIT READER
// ================================================================================================

struct BitReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn remaining(&self) -> usize {
        8 * self.bytes.len() - self.pos
    }

    fn read_bit(&mut self) -> Option<u32> {
        let byte = self.bytes.get(self.pos / 8)?;
        let bit = (byte >> (7 - self.pos % 8)) & 1;
        self.pos += 1;
        Some(bit as u32)
    }

    fn read_bits(&mut self, len: u32) -> Option<u32> {
        (0..len).try_fold(0, |acc, _| self.read_bit().map(|bit| (acc << 1) | bit))
    }
}

// COMPRESSION
// ================================================================================================

/// Compresses a list of coefficients into exactly `max_bytes` bytes.
///
/// # Errors
/// - [FalconError::EncodingOverflow] if the encoding needs more than `8 * max_bytes` bits.
/// - [FalconError::InvalidParameter] if a coefficient equals `i16::MIN`, whose magnitude has no
///   decodable encoding.
pub fn compress(coefficients: &[i16], max_bytes: usize) -> Result<Vec<u8>, FalconError> {
    let mut writer = BitWriter::new(max_bytes);
    for &c in coefficients {
        if c == i16::MIN {
            return Err(FalconError::InvalidParameter(
                "coefficient magnitude exceeds i16::MAX".to_string(),
            ));
        }
        let magnitude = c.unsigned_abs() as u32;
        let sign = (c < 0) as u32;
        writer.push((sign << 7) | (magnitude & 0x7f), 8)?;

        let mut high = magnitude >> 7;
        while high >= 8 {
            writer.push(0, 8)?;
            high -= 8;
        }
        writer.push(1, high + 1)?;
    }
    writer.finish()
}

/// Decompresses `n` coefficients out of exactly `max_bytes` bytes.
///
/// # Errors
/// Returns [FalconError::MalformedSignature] if the input has the wrong length, ends before `n`
/// coefficients are read, encodes negative zero or a magnitude beyond `i16::MAX`, or has a
/// non-zero padding bit.
pub fn decompress(bytes: &[u8], max_bytes: usize, n: usize) -> Result<Vec<i16>, FalconError> {
    if bytes.len() != max_bytes {
        return Err(FalconError::MalformedSignature("encoded polynomial has the wrong length"));
    }

    let mut reader = BitReader::new(bytes);
    let mut coefficients = Vec::with_capacity(n);
    for _ in 0..n {
        let low = reader
            .read_bits(8)
            .ok_or(FalconError::MalformedSignature("encoding ends before all coefficients"))?;
        let (negative, low) = (low >> 7 == 1, low & 0x7f);

        let mut high = 0u32;
        loop {
            match reader.read_bit() {
                Some(1) => break,
                Some(_) => high += 1,
                None => {
                    return Err(FalconError::MalformedSignature("unterminated high-bits run"));
                },
            }
            if high > (i16::MAX as u32 >> 7) {
                return Err(FalconError::MalformedSignature("coefficient magnitude too large"));
            }
        }

        let magnitude = ((high << 7) | low) as i16;
        if negative && magnitude == 0 {
            return Err(FalconError::MalformedSignature("negative zero coefficient"));
        }
        coefficients.push(if negative { -magnitude } else { magnitude });
    }

    let padding = reader.remaining() as u32;
    if reader.read_bits(padding % 8).is_some_and(|bits| bits != 0)
        || (0..padding / 8).any(|_| reader.read_bits(8) != Some(0))
    {
        return Err(FalconError::MalformedSignature("non-zero padding"));
    }

    Ok(coefficients)
}
