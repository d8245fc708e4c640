//! Splice descriptors.
//!
//! Every descriptor starts with the same preamble: an 8-bit tag, an 8-bit
//! length and a 32-bit identifier (normally `"CUEI"`). The body that follows
//! depends on the tag; this crate understands the five tags defined by
//! SCTE-35 and rejects the rest with [`DecodeError::UnsupportedDescriptor`].

mod segmentation;

pub use segmentation::*;

use crate::bit_reader::BitReader;
use crate::encoding::{BitAccumulator, Encodable};
use crate::error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use tracing::{trace, warn};

#[cfg(feature = "serde")]
use serde::Serialize;

/// `splice_descriptor_tag` of [`AvailDescriptor`].
pub const AVAIL_DESCRIPTOR_TAG: u8 = 0x00;
/// `splice_descriptor_tag` of [`DtmfDescriptor`].
pub const DTMF_DESCRIPTOR_TAG: u8 = 0x01;
/// `splice_descriptor_tag` of [`SegmentationDescriptor`].
pub const SEGMENTATION_DESCRIPTOR_TAG: u8 = 0x02;
/// `splice_descriptor_tag` of [`TimeDescriptor`].
pub const TIME_DESCRIPTOR_TAG: u8 = 0x03;
/// `splice_descriptor_tag` of [`AudioDescriptor`].
pub const AUDIO_DESCRIPTOR_TAG: u8 = 0x04;

/// Identifier carried by SCTE-35 defined descriptors.
pub const CUEI_IDENTIFIER: [u8; 4] = *b"CUEI";

/// Size of the identifier field in bytes.
const IDENTIFIER_LENGTH: usize = 4;

/// A decoded splice descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SpliceDescriptor {
    /// Length declared on the wire. Recomputed when encoding.
    pub descriptor_length: u8,
    /// 32-bit identifier as found on the wire, normally `"CUEI"`.
    pub identifier: [u8; 4],
    pub body: DescriptorBody,
}

/// The tag-specific part of a descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum DescriptorBody {
    /// Tag 0x00.
    Avail(AvailDescriptor),
    /// Tag 0x01.
    Dtmf(DtmfDescriptor),
    /// Tag 0x02, see [`SegmentationDescriptor`].
    Segmentation(SegmentationDescriptor),
    /// Tag 0x03.
    Time(TimeDescriptor),
    /// Tag 0x04.
    Audio(AudioDescriptor),
}

/// `avail_descriptor()`, tag 0x00.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AvailDescriptor {
    pub provider_avail_id: u32,
}

/// `DTMF_descriptor()`, tag 0x01.
///
/// The DTMF characters are kept the way they appear on the wire: one packed
/// big-endian integer of `dtmf_count` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DtmfDescriptor {
    /// Pre-roll in tenths of a second.
    pub preroll: u8,
    /// Number of DTMF characters, at most 7.
    pub dtmf_count: u8,
    pub dtmf_chars: u64,
}

/// `time_descriptor()`, tag 0x03.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct TimeDescriptor {
    /// 48-bit TAI seconds.
    pub tai_seconds: u64,
    pub tai_ns: u32,
    pub utc_offset: u16,
}

/// `audio_descriptor()`, tag 0x04.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AudioDescriptor {
    /// At most 15 components.
    pub components: Vec<AudioComponent>,
}

/// One audio component of an [`AudioDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct AudioComponent {
    pub component_tag: u8,
    /// 24-bit ISO 639 language code.
    pub iso_code: u32,
    pub bit_stream_mode: u8,
    pub num_channels: u8,
    pub full_srvc_audio: bool,
}

impl SpliceDescriptor {
    /// Wraps `body` in a descriptor with the `"CUEI"` identifier.
    ///
    /// # Errors
    ///
    /// [`EncodeError::InvalidLength`] when the identifier and body do not
    /// fit the 8-bit `descriptor_length`.
    pub fn new(body: DescriptorBody) -> EncodeResult<Self> {
        let length = IDENTIFIER_LENGTH + body.encoded_len();
        let descriptor_length = u8::try_from(length).map_err(|_| EncodeError::InvalidLength {
            field: "descriptor_length",
            length,
        })?;
        Ok(Self {
            descriptor_length,
            identifier: CUEI_IDENTIFIER,
            body,
        })
    }

    /// Decodes a descriptor whose tag and length have already been read.
    ///
    /// If the body ends before the declared length the remaining bytes are
    /// skipped.
    ///
    /// # Errors
    ///
    /// [`DecodeError::UnsupportedDescriptor`] for tags above 0x04, in which
    /// case nothing is consumed.
    pub fn decode(reader: &mut BitReader, tag: u8, length: u8) -> DecodeResult<Self> {
        if tag > AUDIO_DESCRIPTOR_TAG {
            return Err(DecodeError::UnsupportedDescriptor(tag));
        }
        if (length as usize) < IDENTIFIER_LENGTH {
            return Err(DecodeError::InvalidLength {
                field: "descriptor_length",
                declared: length as usize,
                reason: "no room for the identifier",
            });
        }

        let start = reader.offset();
        let end = start + length as usize * 8;
        let identifier = (reader.read_bits(32)? as u32).to_be_bytes();
        trace!(tag, length, identifier = %String::from_utf8_lossy(&identifier), "splice descriptor");

        let body = match tag {
            AVAIL_DESCRIPTOR_TAG => DescriptorBody::Avail(AvailDescriptor {
                provider_avail_id: reader.read_bits(32)? as u32,
            }),
            DTMF_DESCRIPTOR_TAG => {
                let preroll = reader.read_bits(8)? as u8;
                let dtmf_count = reader.read_bits(3)? as u8;
                reader.skip_bits(5)?;
                let dtmf_chars = reader.read_bits(dtmf_count as usize * 8)?;
                DescriptorBody::Dtmf(DtmfDescriptor {
                    preroll,
                    dtmf_count,
                    dtmf_chars,
                })
            }
            SEGMENTATION_DESCRIPTOR_TAG => {
                DescriptorBody::Segmentation(SegmentationDescriptor::decode(reader, end)?)
            }
            TIME_DESCRIPTOR_TAG => DescriptorBody::Time(TimeDescriptor {
                tai_seconds: reader.read_bits(48)?,
                tai_ns: reader.read_bits(32)? as u32,
                utc_offset: reader.read_bits(16)? as u16,
            }),
            _ => {
                let count = reader.read_bits(4)? as usize;
                reader.skip_bits(4)?;
                let mut components = Vec::with_capacity(count);
                for _ in 0..count {
                    components.push(AudioComponent {
                        component_tag: reader.read_bits(8)? as u8,
                        iso_code: reader.read_bits(24)? as u32,
                        bit_stream_mode: reader.read_bits(3)? as u8,
                        num_channels: reader.read_bits(4)? as u8,
                        full_srvc_audio: reader.read_flag()?,
                    });
                }
                DescriptorBody::Audio(AudioDescriptor { components })
            }
        };

        match reader.offset().cmp(&end) {
            Ordering::Less => {
                warn!(
                    tag,
                    length,
                    unread = (end - reader.offset()) / 8,
                    "descriptor shorter than its declared length, skipping the rest"
                );
                reader.skip_bits(end - reader.offset())?;
            }
            Ordering::Greater => {
                warn!(
                    tag,
                    length,
                    consumed = (reader.offset() - start).div_ceil(8),
                    "descriptor longer than its declared length"
                );
            }
            Ordering::Equal => {}
        }

        Ok(Self {
            descriptor_length: length,
            identifier,
            body,
        })
    }

    /// The identifier as text, with non-UTF-8 bytes replaced.
    pub fn identifier_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.identifier)
    }

    /// The `splice_descriptor_tag` of this descriptor.
    pub fn tag(&self) -> u8 {
        self.body.tag()
    }

    /// Human-readable descriptor name, e.g. `"Segmentation Descriptor"`.
    pub fn name(&self) -> &'static str {
        match self.body {
            DescriptorBody::Avail(_) => "Avail Descriptor",
            DescriptorBody::Dtmf(_) => "DTMF Descriptor",
            DescriptorBody::Segmentation(_) => "Segmentation Descriptor",
            DescriptorBody::Time(_) => "Time Descriptor",
            DescriptorBody::Audio(_) => "Audio Descriptor",
        }
    }

    /// Returns the segmentation descriptor, if this is one.
    pub fn as_segmentation(&self) -> Option<&SegmentationDescriptor> {
        match &self.body {
            DescriptorBody::Segmentation(segmentation) => Some(segmentation),
            _ => None,
        }
    }
}

impl DescriptorBody {
    /// The `splice_descriptor_tag` this body is written with.
    pub fn tag(&self) -> u8 {
        match self {
            DescriptorBody::Avail(_) => AVAIL_DESCRIPTOR_TAG,
            DescriptorBody::Dtmf(_) => DTMF_DESCRIPTOR_TAG,
            DescriptorBody::Segmentation(_) => SEGMENTATION_DESCRIPTOR_TAG,
            DescriptorBody::Time(_) => TIME_DESCRIPTOR_TAG,
            DescriptorBody::Audio(_) => AUDIO_DESCRIPTOR_TAG,
        }
    }

    /// Body size in bytes, excluding the identifier.
    pub(crate) fn encoded_len(&self) -> usize {
        match self {
            DescriptorBody::Avail(_) => 4,
            DescriptorBody::Dtmf(dtmf) => 2 + dtmf.dtmf_count as usize,
            DescriptorBody::Segmentation(segmentation) => segmentation.encoded_len(),
            DescriptorBody::Time(_) => 12,
            DescriptorBody::Audio(audio) => 1 + 6 * audio.components.len(),
        }
    }
}

impl DtmfDescriptor {
    /// Builds a descriptor from up to 7 DTMF characters.
    pub fn new(preroll: u8, chars: &str) -> EncodeResult<Self> {
        if chars.len() > 7 || !chars.is_ascii() {
            return Err(EncodeError::MalformedLiteral {
                field: "dtmf_chars",
                value: chars.to_string(),
            });
        }
        let dtmf_chars = chars
            .bytes()
            .fold(0u64, |packed, c| (packed << 8) | c as u64);
        Ok(Self {
            preroll,
            dtmf_count: chars.len() as u8,
            dtmf_chars,
        })
    }

    /// The DTMF characters as text, e.g. `"1*#"`.
    pub fn dtmf_string(&self) -> String {
        (0..self.dtmf_count as u32)
            .rev()
            .map(|i| ((self.dtmf_chars >> (i * 8)) & 0xFF) as u8 as char)
            .collect()
    }
}

impl AudioComponent {
    /// The ISO 639 language code as text, e.g. `"eng"`.
    pub fn language(&self) -> String {
        let bytes = self.iso_code.to_be_bytes();
        String::from_utf8_lossy(&bytes[1..]).into_owned()
    }
}

impl Encodable for SpliceDescriptor {
    /// Writes tag, recomputed length, identifier and body.
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()> {
        let mut body = BitAccumulator::with_capacity(IDENTIFIER_LENGTH + self.body.encoded_len());
        body.append_slice(&self.identifier);
        self.body.encode(&mut body)?;
        let body = body.finalize();
        let length = u8::try_from(body.len()).map_err(|_| EncodeError::InvalidLength {
            field: "descriptor_length",
            length: body.len(),
        })?;

        acc.append_bits("splice_descriptor_tag", self.tag() as u64, 8)?;
        acc.append_bits("descriptor_length", length as u64, 8)?;
        acc.append_slice(&body);
        Ok(())
    }
}

impl Encodable for DescriptorBody {
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()> {
        match self {
            DescriptorBody::Avail(avail) => {
                acc.append_bits("provider_avail_id", avail.provider_avail_id as u64, 32)?;
            }
            DescriptorBody::Dtmf(dtmf) => {
                acc.append_bits("preroll", dtmf.preroll as u64, 8)?;
                acc.append_bits("dtmf_count", dtmf.dtmf_count as u64, 3)?;
                acc.reserved(5);
                acc.append_bits("dtmf_chars", dtmf.dtmf_chars, dtmf.dtmf_count as u32 * 8)?;
            }
            DescriptorBody::Segmentation(segmentation) => segmentation.encode(acc)?,
            DescriptorBody::Time(time) => {
                acc.append_bits("tai_seconds", time.tai_seconds, 48)?;
                acc.append_bits("tai_ns", time.tai_ns as u64, 32)?;
                acc.append_bits("utc_offset", time.utc_offset as u64, 16)?;
            }
            DescriptorBody::Audio(audio) => {
                acc.append_bits("component_count", audio.components.len() as u64, 4)?;
                acc.reserved(4);
                for component in &audio.components {
                    acc.append_bits("component_tag", component.component_tag as u64, 8)?;
                    acc.append_bits("iso_code", component.iso_code as u64, 24)?;
                    acc.append_bits("bit_stream_mode", component.bit_stream_mode as u64, 3)?;
                    acc.append_bits("num_channels", component.num_channels as u64, 4)?;
                    acc.append_flag(component.full_srvc_audio);
                }
            }
        }
        Ok(())
    }
}

impl TryFrom<SegmentationDescriptor> for SpliceDescriptor {
    type Error = EncodeError;

    fn try_from(segmentation: SegmentationDescriptor) -> EncodeResult<Self> {
        SpliceDescriptor::new(DescriptorBody::Segmentation(segmentation))
    }
}

impl Display for SpliceDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(
            f,
            "  {} (tag 0x{:02x}, length {}, identifier {:?})",
            self.name(),
            self.tag(),
            self.descriptor_length,
            self.identifier_text()
        )?;
        match &self.body {
            DescriptorBody::Avail(avail) => {
                writeln!(f, "    Provider avail id: {}", avail.provider_avail_id)
            }
            DescriptorBody::Dtmf(dtmf) => {
                writeln!(f, "    Preroll: {}", dtmf.preroll)?;
                writeln!(f, "    DTMF: {:?}", dtmf.dtmf_string())
            }
            DescriptorBody::Segmentation(segmentation) => write!(f, "{segmentation}"),
            DescriptorBody::Time(time) => writeln!(
                f,
                "    TAI: {}.{:09} (UTC offset {})",
                time.tai_seconds, time.tai_ns, time.utc_offset
            ),
            DescriptorBody::Audio(audio) => {
                for component in &audio.components {
                    writeln!(
                        f,
                        "    Component 0x{:02x}: {} mode {} channels {} full service {}",
                        component.component_tag,
                        component.language(),
                        component.bit_stream_mode,
                        component.num_channels,
                        component.full_srvc_audio
                    )?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(bytes: &[u8]) -> DecodeResult<SpliceDescriptor> {
        let mut reader = BitReader::new(bytes);
        let tag = reader.read_bits(8)? as u8;
        let length = reader.read_bits(8)? as u8;
        let descriptor = SpliceDescriptor::decode(&mut reader, tag, length)?;
        assert_eq!(reader.offset(), (2 + length as usize) * 8);
        Ok(descriptor)
    }

    #[test]
    fn test_avail_descriptor() {
        let bytes = [0x00, 0x08, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x04, 0xD2];
        let descriptor = decode(&bytes).unwrap();
        assert_eq!(descriptor.name(), "Avail Descriptor");
        assert_eq!(descriptor.identifier, CUEI_IDENTIFIER);
        assert_eq!(
            descriptor.body,
            DescriptorBody::Avail(AvailDescriptor {
                provider_avail_id: 1234
            })
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn test_dtmf_descriptor() {
        let bytes = [
            0x01, 0x09, b'C', b'U', b'E', b'I', 0x32, 0x7F, b'1', b'2', b'3',
        ];
        let descriptor = decode(&bytes).unwrap();
        let DescriptorBody::Dtmf(dtmf) = descriptor.body else {
            panic!("expected DTMF, got {:?}", descriptor.body);
        };
        assert_eq!(dtmf.preroll, 50);
        assert_eq!(dtmf.dtmf_count, 3);
        assert_eq!(dtmf.dtmf_chars, 0x313233);
        assert_eq!(dtmf.dtmf_string(), "123");
        assert_eq!(dtmf, DtmfDescriptor::new(50, "123").unwrap());
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn test_dtmf_rejects_too_many_chars() {
        assert!(DtmfDescriptor::new(0, "12345678").is_err());
    }

    #[test]
    fn test_time_descriptor() {
        let bytes = [
            0x03, 0x10, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x5F, 0x5E, 0x10, 0x00, 0x3B, 0x9A,
            0xC9, 0xFF, 0x00, 0x25,
        ];
        let descriptor = decode(&bytes).unwrap();
        assert_eq!(
            descriptor.body,
            DescriptorBody::Time(TimeDescriptor {
                tai_seconds: 0x5F5E_1000,
                tai_ns: 999_999_999,
                utc_offset: 37,
            })
        );
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn test_audio_descriptor() {
        let bytes = [
            0x04, 0x11, b'C', b'U', b'E', b'I', 0x2F, // two components
            0x01, b'e', b'n', b'g', 0x45, // mode 2, 2 channels, full service
            0x02, b's', b'p', b'a', 0x0A, // mode 0, 5 channels
        ];
        let descriptor = decode(&bytes).unwrap();
        let DescriptorBody::Audio(ref audio) = descriptor.body else {
            panic!("expected audio, got {:?}", descriptor.body);
        };
        assert_eq!(audio.components.len(), 2);
        assert_eq!(
            audio.components[0],
            AudioComponent {
                component_tag: 1,
                iso_code: 0x656E67,
                bit_stream_mode: 2,
                num_channels: 2,
                full_srvc_audio: true,
            }
        );
        assert_eq!(audio.components[1].language(), "spa");
        assert_eq!(audio.components[1].num_channels, 5);
        assert!(!audio.components[1].full_srvc_audio);
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn test_unsupported_tag_consumes_nothing() {
        let bytes = [0xAA, 0xBB];
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            SpliceDescriptor::decode(&mut reader, 0x05, 2),
            Err(DecodeError::UnsupportedDescriptor(0x05))
        );
        assert_eq!(reader.offset(), 0);
    }

    #[test]
    fn test_length_too_short_for_identifier() {
        let mut reader = BitReader::new(b"CU");
        assert!(matches!(
            SpliceDescriptor::decode(&mut reader, AVAIL_DESCRIPTOR_TAG, 2),
            Err(DecodeError::InvalidLength { declared: 2, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_are_skipped() {
        let bytes = [
            0x00, 0x0A, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x00, 0x01, 0xDE, 0xAD,
        ];
        let descriptor = decode(&bytes).unwrap();
        assert_eq!(descriptor.descriptor_length, 10);
        // encoding recomputes the length without the junk
        assert_eq!(
            descriptor.encode_to_vec().unwrap(),
            [0x00, 0x08, b'C', b'U', b'E', b'I', 0x00, 0x00, 0x00, 0x01]
        );
    }

    #[test]
    fn test_non_ascii_identifier_round_trip() {
        let bytes = [0x00, 0x08, 0xFF, b'U', b'E', 0x80, 0x00, 0x00, 0x00, 0x07];
        let descriptor = decode(&bytes).unwrap();
        assert_eq!(descriptor.identifier, [0xFF, b'U', b'E', 0x80]);
        assert_eq!(descriptor.identifier_text(), "\u{FFFD}UE\u{FFFD}");
        assert_eq!(descriptor.encode_to_vec().unwrap(), bytes);
    }

    #[test]
    fn test_new_computes_length() {
        let descriptor = SpliceDescriptor::new(DescriptorBody::Avail(AvailDescriptor {
            provider_avail_id: 1,
        }))
        .unwrap();
        assert_eq!(descriptor.descriptor_length, 8);
        assert_eq!(descriptor.identifier, CUEI_IDENTIFIER);
    }

    #[test]
    fn test_new_rejects_oversized_body() {
        let components = vec![
            AudioComponent {
                component_tag: 0,
                iso_code: 0x656E67,
                bit_stream_mode: 0,
                num_channels: 2,
                full_srvc_audio: true,
            };
            42
        ];
        assert_eq!(
            SpliceDescriptor::new(DescriptorBody::Audio(AudioDescriptor { components })),
            Err(EncodeError::InvalidLength {
                field: "descriptor_length",
                length: 4 + 1 + 6 * 42,
            })
        );
    }
}
