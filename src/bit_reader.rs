//! Bit-level reading utilities for parsing SCTE-35 binary data.
//!
//! This module provides the `BitReader` struct which enables reading arbitrary
//! numbers of bits from a byte buffer, as laid out in SCTE-35 sections.
//! Every read either consumes exactly the requested bits or fails with
//! [`DecodeError::TruncatedInput`] without moving the cursor.

use crate::error::{DecodeError, DecodeResult};
use data_encoding::HEXLOWER;

/// Number of 90 kHz clock ticks in one second.
pub(crate) const TICKS_PER_SECOND: f64 = 90_000.0;

/// A forward-only reader that extracts values at the bit level from a byte buffer.
///
/// SCTE-35 messages contain fields that are not byte-aligned, requiring
/// bit-level parsing. This reader maintains a bit offset and provides
/// methods to read the field shapes the standard uses.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> BitReader<'a> {
    /// Creates a new `BitReader` for the given buffer, starting at bit offset 0.
    pub fn new(buffer: &'a [u8]) -> Self {
        BitReader { buffer, offset: 0 }
    }

    fn ensure(&self, num_bits: usize) -> DecodeResult<()> {
        let available = self.remaining_bits();
        if num_bits > available {
            return Err(DecodeError::TruncatedInput {
                offset: self.offset,
                needed: num_bits,
                available,
            });
        }
        Ok(())
    }

    /// Reads up to 64 bits as an unsigned integer, most significant bit first.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TruncatedInput`] if reading would exceed the buffer bounds.
    pub fn read_bits(&mut self, num_bits: usize) -> DecodeResult<u64> {
        debug_assert!(num_bits <= 64, "read_bits supports at most 64 bits");
        self.ensure(num_bits)?;

        let mut value: u64 = 0;
        let mut bits_read = 0;

        while bits_read < num_bits {
            let byte = self.buffer[self.offset / 8];
            let bit_offset = self.offset % 8;
            let bits_to_read = std::cmp::min(num_bits - bits_read, 8 - bit_offset);
            let mask = if bits_to_read >= 8 {
                0xFF
            } else {
                (1u8 << bits_to_read) - 1
            };
            let bits_value = (byte >> (8 - bit_offset - bits_to_read)) & mask;

            value = (value << bits_to_read) | (bits_value as u64);
            self.offset += bits_to_read;
            bits_read += bits_to_read;
        }

        Ok(value)
    }

    /// Reads a single bit as a flag.
    pub fn read_flag(&mut self) -> DecodeResult<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    /// Reads `num_bits` as a big-endian byte string.
    ///
    /// When `num_bits` is not a multiple of 8 the leading partial bits are
    /// right-aligned in the first byte, so the result is the field's value as
    /// a big-endian integer.
    pub fn read_bytes(&mut self, num_bits: usize) -> DecodeResult<Vec<u8>> {
        self.ensure(num_bits)?;

        let mut bytes = Vec::with_capacity(num_bits.div_ceil(8));
        let leading = num_bits % 8;
        if leading > 0 {
            bytes.push(self.read_bits(leading)? as u8);
        }
        for _ in 0..num_bits / 8 {
            bytes.push(self.read_bits(8)? as u8);
        }
        Ok(bytes)
    }

    /// Reads `num_bits` and renders them as a `0x`-prefixed lowercase hex
    /// literal without leading zeros, e.g. `0xfc` or `0x0`.
    pub fn read_hex(&mut self, num_bits: usize) -> DecodeResult<String> {
        let bytes = self.read_bytes(num_bits)?;
        let digits = HEXLOWER.encode(&bytes);
        let trimmed = digits.trim_start_matches('0');
        Ok(if trimmed.is_empty() {
            "0x0".to_string()
        } else {
            format!("0x{trimmed}")
        })
    }

    /// Reads `num_bits` as text. Invalid UTF-8 sequences are replaced, so use
    /// [`BitReader::read_bytes`] for fields that are written back.
    pub fn read_ascii(&mut self, num_bits: usize) -> DecodeResult<String> {
        let bytes = self.read_bytes(num_bits)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads a 90 kHz tick count and converts it to seconds.
    pub fn read_90k(&mut self, num_bits: usize) -> DecodeResult<f64> {
        Ok(self.read_bits(num_bits)? as f64 / TICKS_PER_SECOND)
    }

    /// Skips a specified number of bits in the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::TruncatedInput`] if skipping would exceed the buffer bounds.
    pub fn skip_bits(&mut self, num_bits: usize) -> DecodeResult<()> {
        self.ensure(num_bits)?;
        self.offset += num_bits;
        Ok(())
    }

    /// Gets the current bit offset in the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bits left in the buffer.
    pub fn remaining_bits(&self) -> usize {
        self.buffer.len() * 8 - self.offset
    }
}
