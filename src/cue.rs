//! A complete splice info section: header, command, descriptors and CRC.

use crate::bit_reader::BitReader;
use crate::crc::{self, CRC_LENGTH, CrcValidatable, calculate_crc};
use crate::descriptors::SpliceDescriptor;
use crate::encoding::{BitAccumulator, Encodable};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use crate::fmt::format_as_hex;
use crate::info::{HEADER_BYTES_AFTER_SECTION_LENGTH, InfoSection};
use data_encoding::{BASE64, HEXLOWER, HEXLOWER_PERMISSIVE};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::{trace, warn};

/// `splice_command_length` value used by legacy encoders that did not
/// compute the command length.
pub const UNKNOWN_COMMAND_LENGTH: u16 = 0xFFF;

/// Largest value the 12-bit length fields can carry.
const MAX_12_BIT: usize = 0xFFF;

/// A decoded SCTE-35 cue.
///
/// The splice command body is kept as raw bytes; its type and length are in
/// [`InfoSection`].
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub info: InfoSection,
    /// Raw `splice_command()` bytes.
    pub splice_command: Vec<u8>,
    /// Descriptor loop length as found on the wire.
    pub descriptor_loop_length: u16,
    pub descriptors: Vec<SpliceDescriptor>,
    /// CRC-32 found at the end of the section.
    pub crc_32: u32,
    /// Whether `crc_32` matched the section content.
    pub crc_valid: bool,
}

impl Cue {
    /// Creates a cue carrying the given raw splice command and no descriptors.
    ///
    /// # Errors
    ///
    /// [`EncodeError::InvalidLength`] when the command is 0xFFF bytes or
    /// longer, which `splice_command_length` cannot express.
    pub fn new(splice_command_type: u8, splice_command: Vec<u8>) -> EncodeResult<Self> {
        let info = InfoSection {
            splice_command_type,
            splice_command_length: command_length(&splice_command)?,
            ..InfoSection::default()
        };
        Ok(Self {
            info,
            splice_command,
            descriptor_loop_length: 0,
            descriptors: Vec::new(),
            crc_32: 0,
            crc_valid: false,
        })
    }

    pub fn add_descriptor(&mut self, descriptor: SpliceDescriptor) {
        self.descriptors.push(descriptor);
    }

    /// Decodes a complete splice info section.
    ///
    /// Descriptors with tags this crate does not support are skipped. Bytes
    /// after the section (as given by `section_length`) are ignored.
    pub fn decode(buffer: &[u8]) -> DecodeResult<Self> {
        let mut reader = BitReader::new(buffer);
        let info = InfoSection::decode(&mut reader)?;

        if info.splice_command_length == UNKNOWN_COMMAND_LENGTH {
            return Err(DecodeError::UnknownCommandLength);
        }
        let splice_command = reader.read_bytes(info.splice_command_length as usize * 8)?;

        let descriptor_loop_length = reader.read_bits(16)? as u16;
        let descriptor_loop = reader.read_bytes(descriptor_loop_length as usize * 8)?;
        let descriptors = decode_descriptor_loop(&descriptor_loop)?;

        let content_end = reader.offset() / 8;
        let section_end = 3 + info.section_length as usize;
        if section_end < content_end + CRC_LENGTH {
            return Err(DecodeError::InvalidLength {
                field: "section_length",
                declared: info.section_length as usize,
                reason: "shorter than the command and descriptors it holds",
            });
        }
        if section_end > content_end + CRC_LENGTH {
            warn!(
                section_length = info.section_length,
                extra = section_end - content_end - CRC_LENGTH,
                "section has bytes between the descriptors and the CRC"
            );
        }
        let section = buffer.get(..section_end).ok_or(DecodeError::TruncatedInput {
            offset: content_end * 8,
            needed: (section_end - content_end) * 8,
            available: (buffer.len() - content_end) * 8,
        })?;

        let (covered, crc_32) = crc::split_crc(section)?;
        let crc_valid = crc::check(covered, crc_32)?;

        Ok(Self {
            info,
            splice_command,
            descriptor_loop_length,
            descriptors,
            crc_32,
            crc_valid,
        })
    }

    /// Decodes a base64 payload.
    pub fn from_base64(text: &str) -> DecodeResult<Self> {
        let bytes = BASE64
            .decode(text.trim().as_bytes())
            .map_err(|e| DecodeError::InvalidPayload(format!("invalid base64: {e}")))?;
        Self::decode(&bytes)
    }

    /// Decodes a hex payload, with or without a `0x` prefix.
    pub fn from_hex(text: &str) -> DecodeResult<Self> {
        let text = text.trim();
        let digits = text
            .strip_prefix("0x")
            .or_else(|| text.strip_prefix("0X"))
            .unwrap_or(text);
        let bytes = HEXLOWER_PERMISSIVE
            .decode(digits.as_bytes())
            .map_err(|e| DecodeError::InvalidPayload(format!("invalid hex: {e}")))?;
        Self::decode(&bytes)
    }

    /// Encodes the cue, recomputing `section_length`,
    /// `splice_command_length`, the descriptor loop length and the CRC-32.
    pub fn encode(&self) -> EncodeResult<Vec<u8>> {
        let command_length = command_length(&self.splice_command)?;

        let mut descriptors = BitAccumulator::new();
        for descriptor in &self.descriptors {
            descriptor.encode(&mut descriptors)?;
        }
        let descriptors = descriptors.finalize();
        let loop_length = u16::try_from(descriptors.len()).map_err(|_| EncodeError::InvalidLength {
            field: "descriptor_loop_length",
            length: descriptors.len(),
        })?;

        let section_length = HEADER_BYTES_AFTER_SECTION_LENGTH
            + command_length as usize
            + 2
            + descriptors.len()
            + CRC_LENGTH;
        if section_length > MAX_12_BIT {
            return Err(EncodeError::InvalidLength {
                field: "section_length",
                length: section_length,
            });
        }

        let info = InfoSection {
            section_length: section_length as u16,
            splice_command_length: command_length,
            ..self.info.clone()
        };

        let mut acc = BitAccumulator::with_capacity(3 + section_length);
        info.encode(&mut acc)?;
        acc.append_slice(&self.splice_command);
        acc.append_bits("descriptor_loop_length", loop_length as u64, 16)?;
        acc.append_slice(&descriptors);

        let mut bytes = acc.finalize();
        let crc = calculate_crc(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());
        Ok(bytes)
    }

    /// Encodes the cue as base64.
    pub fn to_base64(&self) -> EncodeResult<String> {
        Ok(BASE64.encode(&self.encode()?))
    }

    /// Encodes the cue as a `0x`-prefixed hex string.
    pub fn to_hex(&self) -> EncodeResult<String> {
        Ok(format!("0x{}", HEXLOWER.encode(&self.encode()?)))
    }
}

/// `splice_command_length` for `command`; 0xFFF is reserved for unknown lengths.
fn command_length(command: &[u8]) -> EncodeResult<u16> {
    if command.len() >= MAX_12_BIT {
        return Err(EncodeError::InvalidLength {
            field: "splice_command_length",
            length: command.len(),
        });
    }
    Ok(command.len() as u16)
}

fn decode_descriptor_loop(bytes: &[u8]) -> DecodeResult<Vec<SpliceDescriptor>> {
    let mut reader = BitReader::new(bytes);
    let mut descriptors = Vec::new();

    while reader.remaining_bits() > 0 {
        let tag = reader.read_bits(8)? as u8;
        let length = reader.read_bits(8)? as u8;
        let body = reader.read_bytes(length as usize * 8)?;

        match SpliceDescriptor::decode(&mut BitReader::new(&body), tag, length) {
            Ok(descriptor) => {
                trace!(tag, length, "decoded {}", descriptor.name());
                descriptors.push(descriptor);
            }
            Err(DecodeError::UnsupportedDescriptor(tag)) => {
                warn!(tag, length, "skipping unsupported splice descriptor");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(descriptors)
}

impl FromStr for Cue {
    type Err = DecodeError;

    /// Parses a base64 payload, or a hex payload when prefixed with `0x`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.starts_with("0x") || s.starts_with("0X") {
            Cue::from_hex(s)
        } else {
            Cue::from_base64(s)
        }
    }
}

impl CrcValidatable for Cue {
    fn validate_crc(&self, original_buffer: &[u8]) -> DecodeResult<bool> {
        let section_end = 3 + self.info.section_length as usize;
        let section = original_buffer
            .get(..section_end)
            .ok_or(DecodeError::TruncatedInput {
                offset: 0,
                needed: section_end * 8,
                available: original_buffer.len() * 8,
            })?;
        let (covered, stored) = crc::split_crc(section)?;
        Ok(stored == self.crc_32 && crc::validate_crc(covered, stored))
    }

    fn get_crc(&self) -> u32 {
        self.crc_32
    }
}

impl Display for Cue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.info)?;
        if !self.splice_command.is_empty() {
            writeln!(f, "Splice Command Data: {}", format_as_hex(&self.splice_command))?;
        }
        writeln!(f, "Descriptors: {}", self.descriptors.len())?;
        for descriptor in &self.descriptors {
            write!(f, "{descriptor}")?;
        }
        writeln!(
            f,
            "CRC-32: 0x{:08x} ({})",
            self.crc_32,
            if self.crc_valid { "valid" } else { "INVALID" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptors::{DescriptorBody, SegmentationDescriptor, SegmentationEvent, SubSegment};
    use crate::descriptors::{AvailDescriptor, DeliveryRestrictions};
    use crate::upid::Upid;

    fn scte35_14_1_example_time_signal() -> Cue {
        let mut cue = Cue::new(0x06, vec![0xFE, 0x72, 0xBD, 0x00, 0x50]).unwrap();
        cue.info.cw_index = "0xff".to_string();

        let descriptor = SegmentationDescriptor {
            segmentation_event_id: "0x4800008e".to_string(),
            event: Some(SegmentationEvent {
                delivery_restrictions: Some(DeliveryRestrictions {
                    web_delivery_allowed_flag: false,
                    no_regional_blackout_flag: true,
                    archive_allowed_flag: true,
                    device_restrictions: 3,
                }),
                components: None,
                segmentation_duration: Some(307.0),
                segmentation_upid: Upid::AiringId {
                    value: "0x2ca0a18a".to_string(),
                    length: 8,
                },
                segmentation_type_id: 0x34,
                segment_num: 2,
                segments_expected: 0,
                sub_segment: Some(SubSegment {
                    sub_segment_num: 154,
                    sub_segments_expected: 201,
                }),
            }),
        };
        cue.add_descriptor(descriptor.try_into().unwrap());
        cue
    }

    #[test]
    fn write_splice_null_as_base64() {
        let cue = Cue::new(0x00, Vec::new()).unwrap();
        assert_eq!(cue.to_base64().unwrap(), "/DARAAAAAAAAAP/wAAAAAHpPv/8=");
    }

    #[test]
    fn test_new_rejects_reserved_command_length() {
        assert_eq!(
            Cue::new(0xFF, vec![0; UNKNOWN_COMMAND_LENGTH as usize]),
            Err(EncodeError::InvalidLength {
                field: "splice_command_length",
                length: 0xFFF,
            })
        );
        let cue = Cue::new(0xFF, vec![0; 0xFFE]).unwrap();
        assert_eq!(cue.info.splice_command_length, 0xFFE);
    }

    #[test]
    fn write_splice_null_as_hex() {
        let cue = Cue::new(0x00, Vec::new()).unwrap();
        assert_eq!(
            cue.to_hex().unwrap(),
            "0xfc301100000000000000fff0000000007a4fbfff"
        );
    }

    #[test]
    fn compliance_14_1_example_time_signal_as_base64() {
        assert_eq!(
            scte35_14_1_example_time_signal().to_base64().unwrap(),
            "/DA2AAAAAAAA///wBQb+cr0AUAAgAh5DVUVJSAAAjn/PAAGlmbAICAAAAAAsoKGKNAIAmsm2waDx"
        );
    }

    #[test]
    fn compliance_14_1_example_time_signal_as_hex() {
        assert_eq!(
            scte35_14_1_example_time_signal().to_hex().unwrap(),
            "0xfc3036000000000000fffff00506fe72bd00500020021e435545494800008e7fcf0001a599b00808000000002ca0a18a3402009ac9b6c1a0f1"
        );
    }

    #[test]
    fn test_decode_matches_constructed_cue() {
        let decoded = Cue::from_base64(
            "/DA2AAAAAAAA///wBQb+cr0AUAAgAh5DVUVJSAAAjn/PAAGlmbAICAAAAAAsoKGKNAIAmsm2waDx",
        )
        .unwrap();
        let expected = scte35_14_1_example_time_signal();
        assert_eq!(decoded.descriptors, expected.descriptors);
        assert_eq!(decoded.splice_command, expected.splice_command);
        assert_eq!(decoded.crc_32, 0xB6C1_A0F1);
        assert!(decoded.crc_valid);
        assert_eq!(decoded.descriptor_loop_length, 32);
    }

    #[test]
    fn test_unknown_command_length() {
        // splice_command_length 0xfff
        let bytes = [
            0xFC, 0x30, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0x05,
        ];
        assert_eq!(Cue::decode(&bytes), Err(DecodeError::UnknownCommandLength));
    }

    #[test]
    fn test_unsupported_descriptor_is_skipped() {
        let mut cue = Cue::new(0x00, Vec::new()).unwrap();
        cue.add_descriptor(SpliceDescriptor::new(DescriptorBody::Avail(AvailDescriptor {
            provider_avail_id: 7,
        }))
        .unwrap());
        let mut bytes = cue.encode().unwrap();

        // splice a private descriptor (tag 0xF0) in front of the avail descriptor
        let loop_start = 16;
        bytes.truncate(bytes.len() - CRC_LENGTH);
        bytes.splice(loop_start..loop_start, [0xF0, 0x02, 0xAB, 0xCD]);
        bytes[2] += 4;
        bytes[15] += 4;
        let crc = calculate_crc(&bytes);
        bytes.extend_from_slice(&crc.to_be_bytes());

        let decoded = Cue::decode(&bytes).unwrap();
        assert_eq!(decoded.descriptors, cue.descriptors);
        assert_eq!(decoded.descriptor_loop_length, 14);
    }

    #[test]
    fn test_truncated_section() {
        let bytes = BASE64.decode(b"/DAgAAAAAAAAAP/wBQb+Qjo1vQAKAAhDVUVJAAAE0iVuWvA=").unwrap();
        for len in [0, 5, 14, 20, bytes.len() - 1] {
            let err = Cue::decode(&bytes[..len]).unwrap_err();
            assert!(
                matches!(err, DecodeError::TruncatedInput { .. }),
                "{len} bytes gave {err:?}"
            );
        }
    }

    #[test]
    fn test_from_str_dispatches_on_prefix() {
        let from_b64: Cue = "/DARAAAAAAAAAP/wAAAAAHpPv/8=".parse().unwrap();
        let from_hex: Cue = "0xFC301100000000000000FFF0000000007A4FBFFF".parse().unwrap();
        assert_eq!(from_b64, from_hex);
        assert!(matches!(
            "not a cue!".parse::<Cue>(),
            Err(DecodeError::InvalidPayload(_))
        ));
        assert!(matches!(
            "0xfz".parse::<Cue>(),
            Err(DecodeError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_crc_validatable() {
        let bytes = BASE64.decode(b"/DARAAAAAAAAAP/wAAAAAHpPv/8=").unwrap();
        let cue = Cue::decode(&bytes).unwrap();
        assert_eq!(cue.get_crc(), 0x7A4F_BFFF);
        assert!(cue.validate_crc(&bytes).unwrap());
        assert!(!cue.validate_crc(&bytes[..bytes.len() - 1]).unwrap_or(false));
    }
}
