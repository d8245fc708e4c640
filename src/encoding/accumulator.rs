//! Bit-level accumulator for encoding binary data.

use crate::bit_reader::TICKS_PER_SECOND;
use crate::error::{EncodeError, EncodeResult};
use data_encoding::HEXLOWER_PERMISSIVE;

/// An append-only, big-endian bit buffer.
///
/// Fields are appended most significant first, in wire order. The total
/// number of bits written is tracked explicitly, so a message whose leading
/// bytes happen to be zero keeps its full width when finalized.
#[derive(Debug, Default)]
pub struct BitAccumulator {
    /// Completed bytes.
    buffer: Vec<u8>,
    /// Bits already placed in `current_byte` (0-7).
    bit_position: u8,
    /// Byte being filled.
    current_byte: u8,
    /// Total bits appended so far.
    bit_len: usize,
}

impl BitAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty accumulator with room for `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    fn push_bit(&mut self, bit: bool) {
        if bit {
            self.current_byte |= 0x80 >> self.bit_position;
        }
        self.bit_position += 1;
        self.bit_len += 1;
        if self.bit_position == 8 {
            self.buffer.push(self.current_byte);
            self.current_byte = 0;
            self.bit_position = 0;
        }
    }

    fn push_zeros(&mut self, count: usize) {
        for _ in 0..count {
            self.push_bit(false);
        }
    }

    /// Appends `value` as an unsigned integer of `bits` width.
    ///
    /// Widths above 64 are allowed; the extra high-order bits are zero.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::ValueTooLarge`] if `value` needs more than `bits` bits.
    pub fn append_bits(&mut self, field: &'static str, value: u64, bits: u32) -> EncodeResult<()> {
        if bits < 64 && value >> bits != 0 {
            return Err(EncodeError::ValueTooLarge {
                field,
                bits,
                value: value.to_string(),
            });
        }

        let width = bits.min(64);
        self.push_zeros((bits - width) as usize);
        for shift in (0..width).rev() {
            self.push_bit((value >> shift) & 1 == 1);
        }
        Ok(())
    }

    /// Appends exactly one bit.
    pub fn append_flag(&mut self, flag: bool) {
        self.push_bit(flag);
    }

    /// Converts `seconds` to a 90 kHz tick count and appends it with `bits` width.
    ///
    /// Fractions below one tick are rounded to the nearest tick.
    pub fn append_timestamp_90k(
        &mut self,
        field: &'static str,
        seconds: f64,
        bits: u32,
    ) -> EncodeResult<()> {
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(EncodeError::MalformedLiteral {
                field,
                value: seconds.to_string(),
            });
        }
        let ticks = (seconds * TICKS_PER_SECOND).round();
        if ticks >= u64::MAX as f64 {
            return Err(EncodeError::ValueTooLarge {
                field,
                bits,
                value: seconds.to_string(),
            });
        }
        self.append_bits(field, ticks as u64, bits)
    }

    /// Parses a hex literal such as `0x4800008e` (prefix optional) and appends
    /// it with `bits` width.
    ///
    /// # Errors
    ///
    /// Returns [`EncodeError::MalformedLiteral`] when `text` is not hex.
    pub fn append_hex_literal(
        &mut self,
        field: &'static str,
        text: &str,
        bits: u32,
    ) -> EncodeResult<()> {
        let bytes = parse_hex_literal(field, text)?;
        self.append_raw_bytes(field, &bytes, bits)
    }

    /// Appends `bytes`, read as a big-endian integer, with `bits` width.
    pub fn append_raw_bytes(
        &mut self,
        field: &'static str,
        bytes: &[u8],
        bits: u32,
    ) -> EncodeResult<()> {
        let bits = bits as usize;
        let total = bytes.len() * 8;
        let bit_at = |i: usize| (bytes[i / 8] >> (7 - i % 8)) & 1 == 1;

        if total <= bits {
            self.push_zeros(bits - total);
            for i in 0..total {
                self.push_bit(bit_at(i));
            }
            return Ok(());
        }

        let excess = total - bits;
        if (0..excess).any(bit_at) {
            return Err(EncodeError::ValueTooLarge {
                field,
                bits: bits as u32,
                value: format!("0x{}", HEXLOWER_PERMISSIVE.encode(bytes)),
            });
        }
        for i in excess..total {
            self.push_bit(bit_at(i));
        }
        Ok(())
    }

    /// Appends byte-aligned data verbatim.
    pub fn append_slice(&mut self, bytes: &[u8]) {
        for &byte in bytes {
            for shift in (0..8).rev() {
                self.push_bit((byte >> shift) & 1 == 1);
            }
        }
    }

    /// Appends `count` reserved bits, all set to 1.
    pub fn reserved(&mut self, count: u32) {
        for _ in 0..count {
            self.push_bit(true);
        }
    }

    /// Total number of bits appended so far.
    pub fn bit_len(&self) -> usize {
        self.bit_len
    }

    /// Returns true if no bits have been appended yet.
    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    /// Renders the accumulated bits as bytes.
    ///
    /// The result is always `ceil(bit_len / 8)` bytes long; a trailing
    /// partial byte is padded with zero bits.
    pub fn finalize(mut self) -> Vec<u8> {
        if self.bit_position > 0 {
            self.buffer.push(self.current_byte);
        }
        debug_assert_eq!(self.buffer.len(), self.bit_len.div_ceil(8));
        self.buffer
    }
}

/// Parses a hex literal into big-endian bytes.
pub(crate) fn parse_hex_literal(field: &'static str, text: &str) -> EncodeResult<Vec<u8>> {
    let malformed = || EncodeError::MalformedLiteral {
        field,
        value: text.to_string(),
    };

    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    if digits.is_empty() {
        return Err(malformed());
    }

    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    HEXLOWER_PERMISSIVE
        .decode(padded.as_bytes())
        .map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bit_reader::BitReader;

    #[test]
    fn test_append_single_byte() {
        let mut acc = BitAccumulator::new();
        acc.append_bits("byte", 0xAB, 8).unwrap();
        assert_eq!(acc.finalize(), vec![0xAB]);
    }

    #[test]
    fn test_append_bits_across_bytes() {
        let mut acc = BitAccumulator::new();
        acc.append_bits("a", 0b101, 3).unwrap();
        acc.append_bits("b", 0b11001, 5).unwrap();
        acc.append_bits("c", 0b0110, 4).unwrap();
        acc.append_bits("d", 0b1111, 4).unwrap();
        assert_eq!(acc.bit_len(), 16);
        assert_eq!(acc.finalize(), vec![0b10111001, 0b01101111]);
    }

    #[test]
    fn test_leading_zero_bytes_are_kept() {
        let mut acc = BitAccumulator::new();
        acc.append_bits("zero", 0, 16).unwrap();
        acc.append_bits("one", 1, 8).unwrap();
        assert_eq!(acc.finalize(), vec![0x00, 0x00, 0x01]);
    }

    #[test]
    fn test_width_wider_than_64_bits() {
        let mut acc = BitAccumulator::new();
        acc.append_bits("wide", 0xFF, 72).unwrap();
        assert_eq!(acc.finalize(), vec![0, 0, 0, 0, 0, 0, 0, 0, 0xFF]);
    }

    #[test]
    fn test_value_too_large() {
        let mut acc = BitAccumulator::new();
        let err = acc.append_bits("nibble", 0x1F, 4).unwrap_err();
        assert_eq!(
            err,
            EncodeError::ValueTooLarge {
                field: "nibble",
                bits: 4,
                value: "31".to_string(),
            }
        );
        assert!(acc.is_empty());
    }

    #[test]
    fn test_flags_and_reserved() {
        let mut acc = BitAccumulator::new();
        acc.append_flag(true);
        acc.append_flag(false);
        acc.reserved(6);
        assert_eq!(acc.finalize(), vec![0b1011_1111]);
    }

    #[test]
    fn test_partial_byte_finalize() {
        let mut acc = BitAccumulator::new();
        acc.append_bits("five", 0b10110, 5).unwrap();
        assert_eq!(acc.finalize(), vec![0b10110000]);
    }

    #[test]
    fn test_hex_literal() {
        let mut acc = BitAccumulator::new();
        acc.append_hex_literal("event_id", "0x4800008e", 32).unwrap();
        acc.append_hex_literal("tier", "fff", 12).unwrap();
        acc.append_hex_literal("cw_index", "0X0", 4).unwrap();
        assert_eq!(acc.finalize(), vec![0x48, 0x00, 0x00, 0x8e, 0xFF, 0xF0]);
    }

    #[test]
    fn test_malformed_hex_literal_is_an_error() {
        let mut acc = BitAccumulator::new();
        for text in ["", "0x", "0xzz", "cuei"] {
            let err = acc.append_hex_literal("tier", text, 12).unwrap_err();
            assert_eq!(
                err,
                EncodeError::MalformedLiteral {
                    field: "tier",
                    value: text.to_string(),
                }
            );
        }
        assert!(acc.is_empty());
    }

    #[test]
    fn test_hex_literal_too_wide() {
        let mut acc = BitAccumulator::new();
        assert!(matches!(
            acc.append_hex_literal("cw_index", "0x1ff", 8),
            Err(EncodeError::ValueTooLarge { bits: 8, .. })
        ));
    }

    #[test]
    fn test_raw_bytes_padding_and_trimming() {
        let mut acc = BitAccumulator::new();
        acc.append_raw_bytes("padded", &[0xAB], 16).unwrap();
        acc.append_raw_bytes("trimmed", &[0x00, 0x0C], 4).unwrap();
        acc.append_raw_bytes("exact", b"CUEI", 32).unwrap();
        acc.append_bits("tail", 0, 4).unwrap();
        assert_eq!(
            acc.finalize(),
            vec![0x00, 0xAB, 0xC4, 0x35, 0x54, 0x54, 0x90]
        );
    }

    #[test]
    fn test_timestamp_round_trip_within_one_tick() {
        let max_33_bits = ((1u64 << 33) - 1) as f64 / TICKS_PER_SECOND;
        for seconds in [0.0, 0.000011, 1.5, 307.0, 21388.766756, 85_000.123456, max_33_bits] {
            let mut acc = BitAccumulator::new();
            acc.reserved(7);
            acc.append_timestamp_90k("pts", seconds, 33).unwrap();
            let bytes = acc.finalize();

            let mut reader = BitReader::new(&bytes);
            reader.skip_bits(7).unwrap();
            let decoded = reader.read_90k(33).unwrap();
            assert!(
                (decoded - seconds).abs() <= 1.0 / TICKS_PER_SECOND,
                "{seconds} decoded as {decoded}"
            );
        }
    }

    #[test]
    fn test_timestamp_rejects_out_of_range() {
        let mut acc = BitAccumulator::new();
        assert!(matches!(
            acc.append_timestamp_90k("pts", 95_444.0, 33),
            Err(EncodeError::ValueTooLarge { .. })
        ));
        assert!(matches!(
            acc.append_timestamp_90k("pts", -1.0, 33),
            Err(EncodeError::MalformedLiteral { .. })
        ));
        assert!(matches!(
            acc.append_timestamp_90k("pts", f64::NAN, 33),
            Err(EncodeError::MalformedLiteral { .. })
        ));
    }
}
