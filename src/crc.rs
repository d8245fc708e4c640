//! CRC-32 handling for splice info sections.
//!
//! Sections end with a CRC-32/MPEG-2 over every preceding byte. With the
//! `crc-validation` feature a mismatch fails decoding; without it the
//! mismatch is logged and reported through [`crate::Cue::crc_valid`].

use crate::error::{DecodeError, DecodeResult};
use crc::{CRC_32_MPEG_2, Crc};
use tracing::warn;

/// MPEG-2 CRC-32 algorithm instance used by SCTE-35.
pub const MPEG_2: Crc<u32> = Crc::<u32>::new(&CRC_32_MPEG_2);

/// Size in bytes of the trailing CRC field.
pub const CRC_LENGTH: usize = 4;

/// Whether a CRC mismatch fails decoding.
pub const STRICT: bool = cfg!(feature = "crc-validation");

/// Calculates the CRC-32/MPEG-2 of `data`.
pub fn calculate_crc(data: &[u8]) -> u32 {
    MPEG_2.checksum(data)
}

/// Checks `data` against an expected CRC-32.
pub fn validate_crc(data: &[u8], expected_crc: u32) -> bool {
    calculate_crc(data) == expected_crc
}

/// Validates the CRC-32 stored in the last 4 bytes of a complete section.
///
/// # Example
///
/// ```rust
/// use scte35_cue::crc::validate_message_crc;
/// use data_encoding::BASE64;
///
/// let buffer = BASE64.decode(b"/DARAAAAAAAAAP/wAAAAAHpPv/8=").unwrap();
/// assert!(validate_message_crc(&buffer).unwrap());
/// ```
pub fn validate_message_crc(buffer: &[u8]) -> DecodeResult<bool> {
    let (data, stored) = split_crc(buffer)?;
    Ok(validate_crc(data, stored))
}

/// Splits a section into its CRC-covered bytes and the stored CRC-32.
pub(crate) fn split_crc(buffer: &[u8]) -> DecodeResult<(&[u8], u32)> {
    if buffer.len() < CRC_LENGTH {
        return Err(DecodeError::TruncatedInput {
            offset: 0,
            needed: CRC_LENGTH * 8,
            available: buffer.len() * 8,
        });
    }
    let (data, crc_bytes) = buffer.split_at(buffer.len() - CRC_LENGTH);
    let stored = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
    Ok((data, stored))
}

/// Compares the stored CRC against `data`, applying the crate's
/// strictness policy. Returns whether the CRC matched.
pub(crate) fn check(data: &[u8], stored: u32) -> DecodeResult<bool> {
    let calculated = calculate_crc(data);
    if calculated == stored {
        return Ok(true);
    }
    if STRICT {
        return Err(DecodeError::CrcMismatch {
            expected: stored,
            calculated,
        });
    }
    warn!(
        expected = format_args!("0x{stored:08x}"),
        calculated = format_args!("0x{calculated:08x}"),
        "CRC-32 mismatch"
    );
    Ok(false)
}

/// Types that carry a CRC-32 and can check it against their source bytes.
pub trait CrcValidatable {
    /// Re-validates the stored CRC-32 against the original section bytes.
    fn validate_crc(&self, original_buffer: &[u8]) -> DecodeResult<bool>;

    /// Returns the stored CRC-32 value.
    fn get_crc(&self) -> u32;
}
