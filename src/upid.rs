//! UPID (Unique Program Identifier) decoding and encoding.
//!
//! A UPID identifies the content a segmentation descriptor refers to. Its
//! shape is selected by the 8-bit `segmentation_upid_type`; the MID type is
//! a container holding further UPIDs, each with its own type and length.

use crate::bit_reader::BitReader;
use crate::encoding::accumulator::parse_hex_literal;
use crate::encoding::{BitAccumulator, Encodable};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::fmt::{format_as_hex, format_private_data};
use crate::tables::upid_name;
use std::fmt;
use tracing::debug;

/// `segmentation_upid_type` for AiringID.
pub const AIRING_ID: u8 = 0x08;
/// `segmentation_upid_type` for EIDR.
pub const EIDR: u8 = 0x0A;
/// `segmentation_upid_type` for the ATSC content identifier.
pub const ATSC: u8 = 0x0B;
/// `segmentation_upid_type` for the managed private UPID.
pub const MPU: u8 = 0x0C;
/// `segmentation_upid_type` for the multiple-UPID container.
pub const MID: u8 = 0x0D;
/// `segmentation_upid_type` for URI.
pub const URI: u8 = 0x0F;

/// Byte length of a compact binary EIDR.
const EIDR_LENGTH: u8 = 12;

/// A decoded segmentation UPID.
#[derive(Debug, Clone, PartialEq)]
pub enum Upid {
    /// Identifiers carried as plain text: deprecated user defined and ISCI,
    /// Ad-ID, TID, ADI, ADS information, URI, UUID and ACR.
    Text {
        /// The `segmentation_upid_type`.
        upid_type: u8,
        /// The identifier text.
        value: String,
    },
    /// ISAN, deprecated (0x05) or versioned (0x06). ISANs are binary, so the
    /// bytes are kept verbatim.
    Isan {
        /// The `segmentation_upid_type`.
        upid_type: u8,
        /// The raw ISAN bytes.
        data: Vec<u8>,
    },
    /// AiringID, rendered as a hex literal.
    AiringId {
        /// Hex literal such as `0x2ca0a18a`.
        value: String,
        /// Field width in bytes.
        length: u8,
    },
    /// `ATSC_content_identifier()` structure.
    Atsc(AtscContentId),
    /// Compact binary EIDR rendered as `10{prefix}/{suffix}`. Unset when the
    /// field is not 12 bytes long.
    Eidr(Option<String>),
    /// Managed private UPID.
    Mpu(ManagedPrivateUpid),
    /// Multiple UPIDs, in wire order.
    Mid(Vec<Upid>),
    /// Bytes kept verbatim: a type this crate does not interpret, text that
    /// is not UTF-8, or an ATSC or MPU body shorter than its 4 fixed bytes.
    /// The name still follows `upid_type`.
    Unknown {
        /// The `segmentation_upid_type`.
        upid_type: u8,
        /// The raw UPID bytes.
        data: Vec<u8>,
    },
}

/// `ATSC_content_identifier()` fields.
#[derive(Debug, Clone, PartialEq)]
pub struct AtscContentId {
    /// Transport stream id.
    pub tsid: u16,
    /// The 2 reserved bits as found on the wire.
    pub reserved: u8,
    /// Hour of the day (UTC) after which the content id expires.
    pub end_of_day: u8,
    /// Number of days the content id stays unique.
    pub unique_for: u16,
    /// Opaque content id.
    pub content_id: Vec<u8>,
}

/// Managed private UPID fields.
#[derive(Debug, Clone, PartialEq)]
pub struct ManagedPrivateUpid {
    /// 32-bit format identifier as a hex literal, e.g. `0x4d44534e`.
    pub format_identifier: String,
    /// Private data following the format identifier.
    pub private_data: Vec<u8>,
}

impl Upid {
    /// Decodes a UPID of `upid_type` spanning `length` bytes.
    ///
    /// Unrecognized types, and structured types whose length cannot hold
    /// their fixed fields, are kept as [`Upid::Unknown`].
    pub fn decode(reader: &mut BitReader, upid_type: u8, length: u8) -> DecodeResult<Self> {
        let bits = length as usize * 8;

        let upid = match upid_type {
            0x01 | 0x02 | 0x03 | 0x07 | 0x09 | 0x0E | URI | 0x10 | 0x11 => {
                match String::from_utf8(reader.read_bytes(bits)?) {
                    Ok(value) => Upid::Text { upid_type, value },
                    Err(e) => {
                        debug!(upid_type, length, "UPID text is not UTF-8, keeping raw bytes");
                        Upid::Unknown {
                            upid_type,
                            data: e.into_bytes(),
                        }
                    }
                }
            }
            0x05 | 0x06 => Upid::Isan {
                upid_type,
                data: reader.read_bytes(bits)?,
            },
            AIRING_ID => Upid::AiringId {
                value: reader.read_hex(bits)?,
                length,
            },
            EIDR => Upid::Eidr(decode_eidr(reader, length)?),
            ATSC if length >= 4 => Upid::Atsc(AtscContentId {
                tsid: reader.read_bits(16)? as u16,
                reserved: reader.read_bits(2)? as u8,
                end_of_day: reader.read_bits(5)? as u8,
                unique_for: reader.read_bits(9)? as u16,
                content_id: reader.read_bytes(bits - 32)?,
            }),
            MPU if length >= 4 => Upid::Mpu(ManagedPrivateUpid {
                format_identifier: reader.read_hex(32)?,
                private_data: reader.read_bytes(bits - 32)?,
            }),
            MID => Upid::Mid(decode_mid(reader, length)?),
            _ => {
                debug!(upid_type, length, "keeping UPID as raw bytes");
                Upid::Unknown {
                    upid_type,
                    data: reader.read_bytes(bits)?,
                }
            }
        };

        Ok(upid)
    }

    /// The `segmentation_upid_type` of this UPID.
    pub fn upid_type(&self) -> u8 {
        match self {
            Upid::Text { upid_type, .. }
            | Upid::Isan { upid_type, .. }
            | Upid::Unknown { upid_type, .. } => *upid_type,
            Upid::AiringId { .. } => AIRING_ID,
            Upid::Atsc(_) => ATSC,
            Upid::Eidr(_) => EIDR,
            Upid::Mpu(_) => MPU,
            Upid::Mid(_) => MID,
        }
    }

    /// Human-readable name of the UPID type.
    pub fn name(&self) -> &'static str {
        upid_name(self.upid_type())
    }

    /// Number of bytes the UPID occupies on the wire, excluding its type and
    /// length header.
    pub fn encoded_len(&self) -> usize {
        match self {
            Upid::Text { value, .. } => value.len(),
            Upid::Isan { data, .. } => data.len(),
            Upid::AiringId { length, .. } => *length as usize,
            Upid::Atsc(atsc) => 4 + atsc.content_id.len(),
            Upid::Eidr(Some(_)) => EIDR_LENGTH as usize,
            Upid::Eidr(None) => 0,
            Upid::Mpu(mpu) => 4 + mpu.private_data.len(),
            Upid::Mid(upids) => upids.iter().map(|u| 2 + u.encoded_len()).sum(),
            Upid::Unknown { data, .. } => data.len(),
        }
    }
}

fn decode_eidr(reader: &mut BitReader, length: u8) -> DecodeResult<Option<String>> {
    if length != EIDR_LENGTH {
        debug!(length, "EIDR UPID is not 12 bytes, leaving it unset");
        reader.skip_bits(length as usize * 8)?;
        return Ok(None);
    }
    let head = reader.read_bits(16)?;
    let tail = reader.read_hex(80)?;
    Ok(Some(format!("10{head}/{tail}")))
}

fn decode_mid(reader: &mut BitReader, length: u8) -> DecodeResult<Vec<Upid>> {
    let declared = length as usize;
    let mut consumed = 0;
    let mut upids = Vec::new();

    while consumed < declared {
        if declared - consumed < 2 {
            return Err(DecodeError::InvalidLength {
                field: "MID segmentation_upid",
                declared,
                reason: "no room left for a nested UPID header",
            });
        }
        let upid_type = reader.read_bits(8)? as u8;
        let upid_length = reader.read_bits(8)? as u8;
        consumed += 2 + upid_length as usize;
        if consumed > declared {
            return Err(DecodeError::InvalidLength {
                field: "MID segmentation_upid",
                declared,
                reason: "nested UPID overruns the container",
            });
        }
        upids.push(Upid::decode(reader, upid_type, upid_length)?);
    }

    Ok(upids)
}

fn parse_eidr(value: &str) -> EncodeResult<(u64, Vec<u8>)> {
    let malformed = || EncodeError::MalformedLiteral {
        field: "eidr",
        value: value.to_string(),
    };
    let (head, tail) = value
        .strip_prefix("10")
        .and_then(|rest| rest.split_once('/'))
        .ok_or_else(malformed)?;
    let head: u16 = head.parse().map_err(|_| malformed())?;
    let tail = parse_hex_literal("eidr", tail)?;
    Ok((head as u64, tail))
}

impl Encodable for Upid {
    /// Writes the UPID body. The type and length header is written by the
    /// enclosing structure.
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()> {
        match self {
            Upid::Text { value, .. } => acc.append_slice(value.as_bytes()),
            Upid::Isan { data, .. } => acc.append_slice(data),
            Upid::AiringId { value, length } => {
                acc.append_hex_literal("airing_id", value, *length as u32 * 8)?;
            }
            Upid::Atsc(atsc) => {
                acc.append_bits("tsid", atsc.tsid as u64, 16)?;
                acc.append_bits("reserved", atsc.reserved as u64, 2)?;
                acc.append_bits("end_of_day", atsc.end_of_day as u64, 5)?;
                acc.append_bits("unique_for", atsc.unique_for as u64, 9)?;
                acc.append_slice(&atsc.content_id);
            }
            Upid::Eidr(Some(value)) => {
                let (head, tail) = parse_eidr(value)?;
                acc.append_bits("eidr", head, 16)?;
                acc.append_raw_bytes("eidr", &tail, 80)?;
            }
            Upid::Eidr(None) => {
                return Err(EncodeError::UnsupportedVariant {
                    what: "EIDR UPID without a value".to_string(),
                });
            }
            Upid::Mpu(mpu) => {
                acc.append_hex_literal("format_identifier", &mpu.format_identifier, 32)?;
                acc.append_slice(&mpu.private_data);
            }
            Upid::Mid(upids) => {
                for upid in upids {
                    let body = upid.encode_to_vec()?;
                    let length = u8::try_from(body.len()).map_err(|_| EncodeError::InvalidLength {
                        field: "segmentation_upid_length",
                        length: body.len(),
                    })?;
                    acc.append_bits("segmentation_upid_type", upid.upid_type() as u64, 8)?;
                    acc.append_bits("segmentation_upid_length", length as u64, 8)?;
                    acc.append_slice(&body);
                }
            }
            Upid::Unknown { data, .. } => acc.append_slice(data),
        }
        Ok(())
    }
}

impl fmt::Display for Upid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Upid::Text { value, .. } | Upid::AiringId { value, .. } => write!(f, "{value}"),
            Upid::Isan { data, .. } => write!(f, "{}", format_as_hex(data)),
            Upid::Atsc(atsc) => write!(
                f,
                "tsid={} end_of_day={} unique_for={} content_id={}",
                atsc.tsid,
                atsc.end_of_day,
                atsc.unique_for,
                format_as_hex(&atsc.content_id)
            ),
            Upid::Eidr(Some(value)) => write!(f, "{value}"),
            Upid::Eidr(None) => write!(f, "unset"),
            Upid::Mpu(mpu) => write!(
                f,
                "format_identifier={} private_data={}",
                mpu.format_identifier,
                format_private_data(&mpu.private_data)
            ),
            Upid::Mid(upids) => {
                write!(f, "[")?;
                for (i, upid) in upids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}: {upid}", upid.name())?;
                }
                write!(f, "]")
            }
            Upid::Unknown { data, .. } => write!(f, "{}", format_private_data(data)),
        }
    }
}
