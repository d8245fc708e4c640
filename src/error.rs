//! Error types for decoding and encoding SCTE-35 structures.

use thiserror::Error;

/// Result type for decoding operations.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for encoding operations.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that can occur while decoding a splice info section or its parts.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The first byte is not the SCTE-35 table id, so the buffer is not a
    /// splice info section at all. Nothing past the table id was read.
    #[error("table id 0x{found:02x} is not a splice info section (expected 0xfc)")]
    TableIdMismatch {
        /// The table id found in the buffer.
        found: u8,
    },

    /// The buffer ended before a required field could be read.
    #[error("input truncated: needed {needed} bits at bit offset {offset}, only {available} available")]
    TruncatedInput {
        /// Bit offset where the read started.
        offset: usize,
        /// Number of bits requested.
        needed: usize,
        /// Number of bits left in the buffer.
        available: usize,
    },

    /// A splice descriptor tag outside the five kinds this crate understands.
    #[error("unsupported splice descriptor tag 0x{0:02x}")]
    UnsupportedDescriptor(u8),

    /// A declared length cannot hold the structure it announces.
    #[error("invalid {field} length {declared}: {reason}")]
    InvalidLength {
        /// Name of the length field.
        field: &'static str,
        /// The declared length in bytes.
        declared: usize,
        /// Why the length is unusable.
        reason: &'static str,
    },

    /// The splice command length is the legacy `0xFFF` marker, so the command
    /// body cannot be skipped without parsing it.
    #[error("splice command length 0xfff is not supported")]
    UnknownCommandLength,

    /// The trailing CRC-32 does not match the message content.
    #[error("CRC-32 mismatch: message carries 0x{expected:08x}, calculated 0x{calculated:08x}")]
    CrcMismatch {
        /// CRC-32 stored in the message.
        expected: u32,
        /// CRC-32 calculated over the message.
        calculated: u32,
    },

    /// A textual payload is neither valid base64 nor valid hex.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

/// Errors that can occur while encoding SCTE-35 structures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// A textual literal (hex field, identifier, EIDR) could not be parsed.
    #[error("malformed literal for {field}: {value:?}")]
    MalformedLiteral {
        /// Name of the field being encoded.
        field: &'static str,
        /// The offending text.
        value: String,
    },

    /// A value does not fit in the bit width of its field.
    #[error("value {value} does not fit in {bits} bits for field {field}")]
    ValueTooLarge {
        /// Name of the field being encoded.
        field: &'static str,
        /// Bit width of the field.
        bits: u32,
        /// The value that was provided.
        value: String,
    },

    /// The value has no wire representation.
    #[error("cannot encode {what}")]
    UnsupportedVariant {
        /// What could not be encoded.
        what: String,
    },

    /// A variable-length part is longer than its length field can express.
    #[error("{field} length {length} exceeds the field capacity")]
    InvalidLength {
        /// Name of the length field.
        field: &'static str,
        /// The length that was computed.
        length: usize,
    },
}
