//! The fixed splice info section header.

use crate::bit_reader::BitReader;
use crate::encoding::{BitAccumulator, Encodable};
use crate::error::{DecodeError, DecodeResult, EncodeResult};
use crate::fmt::format_seconds;
use crate::tables::splice_command_name;
use std::fmt::{Display, Formatter};
use tracing::trace;

/// The only table id a splice info section may carry.
pub const SPLICE_INFO_TABLE_ID: u8 = 0xFC;

/// Size of the header in bytes, up to and including `splice_command_type`.
pub const HEADER_LENGTH: usize = 14;

/// Number of header bytes that follow `section_length` and therefore count
/// towards it.
pub(crate) const HEADER_BYTES_AFTER_SECTION_LENGTH: usize = HEADER_LENGTH - 3;

/// Header of a `splice_info_section()`, everything before the command body.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoSection {
    /// This is an 8-bit field. Its value shall be 0xFC.
    pub table_id: u8,

    /// Should always be `false`, indicating MPEG short sections.
    pub section_syntax_indicator: bool,

    /// Shall be `false`.
    pub private_indicator: bool,

    /// The 2 reserved bits as found on the wire.
    pub reserved: u8,

    /// Number of bytes following this field, up to and including the CRC.
    pub section_length: u16,

    pub protocol_version: u8,
    pub encrypted_packet: bool,

    /// 6-bit encryption algorithm, see [`EncryptionAlgorithm`].
    pub encryption_algorithm: u8,

    /// PTS adjustment in seconds.
    pub pts_adjustment: f64,

    /// Hex literal of the 8-bit control word index.
    pub cw_index: String,

    /// Hex literal of the 12-bit authorization tier.
    pub tier: String,

    pub splice_command_length: u16,
    pub splice_command_type: u8,
}

impl Default for InfoSection {
    fn default() -> Self {
        Self {
            table_id: SPLICE_INFO_TABLE_ID,
            section_syntax_indicator: false,
            private_indicator: false,
            reserved: 0b11,
            section_length: 0,
            protocol_version: 0,
            encrypted_packet: false,
            encryption_algorithm: 0,
            pts_adjustment: 0.0,
            cw_index: "0x0".to_string(),
            tier: "0xfff".to_string(),
            splice_command_length: 0,
            splice_command_type: 0,
        }
    }
}

impl InfoSection {
    /// Decodes the header from the start of a section.
    ///
    /// # Errors
    ///
    /// [`DecodeError::TableIdMismatch`] when the first byte is not 0xFC. Only
    /// that byte has been consumed in that case.
    pub fn decode(reader: &mut BitReader) -> DecodeResult<Self> {
        let table_id = reader.read_bits(8)? as u8;
        if table_id != SPLICE_INFO_TABLE_ID {
            return Err(DecodeError::TableIdMismatch { found: table_id });
        }

        let section = Self {
            table_id,
            section_syntax_indicator: reader.read_flag()?,
            private_indicator: reader.read_flag()?,
            reserved: reader.read_bits(2)? as u8,
            section_length: reader.read_bits(12)? as u16,
            protocol_version: reader.read_bits(8)? as u8,
            encrypted_packet: reader.read_flag()?,
            encryption_algorithm: reader.read_bits(6)? as u8,
            pts_adjustment: reader.read_90k(33)?,
            cw_index: reader.read_hex(8)?,
            tier: reader.read_hex(12)?,
            splice_command_length: reader.read_bits(12)? as u16,
            splice_command_type: reader.read_bits(8)? as u8,
        };
        trace!(
            section_length = section.section_length,
            splice_command_type = section.splice_command_type,
            splice_command_length = section.splice_command_length,
            "splice info section header"
        );
        Ok(section)
    }

    /// Name of the splice command type, if it is a known one.
    pub fn splice_command_name(&self) -> Option<&'static str> {
        splice_command_name(self.splice_command_type)
    }
}

impl Encodable for InfoSection {
    /// Writes the header. The table id, syntax indicator, private indicator
    /// and reserved bits are always written as 0xFC, 0, 0 and 0b11; every
    /// other field is written as stored.
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()> {
        acc.append_bits("table_id", SPLICE_INFO_TABLE_ID as u64, 8)?;
        acc.append_flag(false);
        acc.append_flag(false);
        acc.reserved(2);
        acc.append_bits("section_length", self.section_length as u64, 12)?;
        acc.append_bits("protocol_version", self.protocol_version as u64, 8)?;
        acc.append_flag(self.encrypted_packet);
        acc.append_bits("encryption_algorithm", self.encryption_algorithm as u64, 6)?;
        acc.append_timestamp_90k("pts_adjustment", self.pts_adjustment, 33)?;
        acc.append_hex_literal("cw_index", &self.cw_index, 8)?;
        acc.append_hex_literal("tier", &self.tier, 12)?;
        acc.append_bits("splice_command_length", self.splice_command_length as u64, 12)?;
        acc.append_bits("splice_command_type", self.splice_command_type as u64, 8)?;
        Ok(())
    }
}

impl Display for InfoSection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Table ID: 0x{:02x}", self.table_id)?;
        writeln!(f, "Section Length: {}", self.section_length)?;
        writeln!(f, "Protocol Version: {}", self.protocol_version)?;
        writeln!(
            f,
            "Encryption: {}",
            EncryptionAlgorithm::from(self.encryption_algorithm)
        )?;
        writeln!(f, "PTS Adjustment: {}", format_seconds(self.pts_adjustment))?;
        writeln!(f, "CW Index: {}", self.cw_index)?;
        writeln!(f, "Tier: {}", self.tier)?;
        writeln!(
            f,
            "Splice Command: 0x{:02x} ({}), {} bytes",
            self.splice_command_type,
            self.splice_command_name().unwrap_or("Reserved"),
            self.splice_command_length
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum EncryptionAlgorithm {
    NotEncrypted,
    DESECBMode,
    DESCBCMode,
    TripleDESEDE3ECBMode,
    Reserved(u8), // 4-31
    Private(u8),  // 32-63
}

impl From<u8> for EncryptionAlgorithm {
    fn from(value: u8) -> Self {
        match value {
            0x00 => EncryptionAlgorithm::NotEncrypted,
            0x01 => EncryptionAlgorithm::DESECBMode,
            0x02 => EncryptionAlgorithm::DESCBCMode,
            0x03 => EncryptionAlgorithm::TripleDESEDE3ECBMode,
            0x04..=0x1F => EncryptionAlgorithm::Reserved(value),
            _ => EncryptionAlgorithm::Private(value),
        }
    }
}

impl Display for EncryptionAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            EncryptionAlgorithm::NotEncrypted => write!(f, "None"),
            EncryptionAlgorithm::DESECBMode => write!(f, "DES - ECB mode"),
            EncryptionAlgorithm::DESCBCMode => write!(f, "DES - CBC mode"),
            EncryptionAlgorithm::TripleDESEDE3ECBMode => write!(f, "Triple DES EDE3 - ECB mode"),
            EncryptionAlgorithm::Reserved(value) => write!(f, "Reserved ({value})"),
            EncryptionAlgorithm::Private(value) => write!(f, "User private ({value})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // header of the SCTE-35 14.1 time_signal example
    const TIME_SIGNAL_HEADER: [u8; 14] = [
        0xFC, 0x30, 0x36, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xF0, 0x05, 0x06,
    ];

    #[test]
    fn test_decode_header() {
        let mut reader = BitReader::new(&TIME_SIGNAL_HEADER);
        let section = InfoSection::decode(&mut reader).unwrap();
        assert_eq!(reader.offset(), HEADER_LENGTH * 8);
        assert_eq!(section.table_id, 0xFC);
        assert!(!section.section_syntax_indicator);
        assert!(!section.private_indicator);
        assert_eq!(section.reserved, 0b11);
        assert_eq!(section.section_length, 54);
        assert_eq!(section.protocol_version, 0);
        assert!(!section.encrypted_packet);
        assert_eq!(section.pts_adjustment, 0.0);
        assert_eq!(section.cw_index, "0xff");
        assert_eq!(section.tier, "0xfff");
        assert_eq!(section.splice_command_length, 5);
        assert_eq!(section.splice_command_type, 0x06);
        assert_eq!(section.splice_command_name(), Some("Time Signal"));
    }

    #[test]
    fn test_table_id_gate_reads_one_byte() {
        let mut bytes = TIME_SIGNAL_HEADER;
        bytes[0] = 0x47;
        let mut reader = BitReader::new(&bytes);
        assert_eq!(
            InfoSection::decode(&mut reader),
            Err(DecodeError::TableIdMismatch { found: 0x47 })
        );
        assert_eq!(reader.offset(), 8);
    }

    #[test]
    fn test_truncated_header() {
        let mut reader = BitReader::new(&TIME_SIGNAL_HEADER[..10]);
        assert!(matches!(
            InfoSection::decode(&mut reader),
            Err(DecodeError::TruncatedInput { .. })
        ));
    }

    #[test]
    fn test_header_round_trip() {
        let mut reader = BitReader::new(&TIME_SIGNAL_HEADER);
        let section = InfoSection::decode(&mut reader).unwrap();
        assert_eq!(section.encode_to_vec().unwrap(), TIME_SIGNAL_HEADER);
    }

    #[test]
    fn test_encode_normalizes_fixed_fields() {
        let section = InfoSection {
            table_id: 0x00,
            section_syntax_indicator: true,
            private_indicator: true,
            reserved: 0,
            section_length: 0x123,
            protocol_version: 7,
            encrypted_packet: true,
            encryption_algorithm: 0x21,
            pts_adjustment: 1.0,
            cw_index: "0x0".to_string(),
            tier: "0x1".to_string(),
            splice_command_length: 0xFFF,
            splice_command_type: 0xFF,
        };
        let bytes = section.encode_to_vec().unwrap();
        assert_eq!(bytes.len(), HEADER_LENGTH);
        assert_eq!(bytes[0], 0xFC);
        assert_eq!(bytes[1], 0x31);

        let decoded = InfoSection::decode(&mut BitReader::new(&bytes)).unwrap();
        assert_eq!(decoded.table_id, 0xFC);
        assert!(!decoded.section_syntax_indicator);
        assert!(!decoded.private_indicator);
        assert_eq!(decoded.reserved, 0b11);
        assert_eq!(decoded.section_length, 0x123);
        assert_eq!(decoded.protocol_version, 7);
        assert!(decoded.encrypted_packet);
        assert_eq!(
            EncryptionAlgorithm::from(decoded.encryption_algorithm),
            EncryptionAlgorithm::Private(0x21)
        );
        assert_eq!(decoded.pts_adjustment, 1.0);
        assert_eq!(decoded.tier, "0x1");
        assert_eq!(decoded.splice_command_length, 0xFFF);
        assert_eq!(decoded.splice_command_type, 0xFF);
    }

    #[test]
    fn test_encode_rejects_bad_literals() {
        let section = InfoSection {
            tier: "0x1000".to_string(),
            ..InfoSection::default()
        };
        assert!(section.encode_to_vec().is_err());

        let section = InfoSection {
            cw_index: "index".to_string(),
            ..InfoSection::default()
        };
        assert!(section.encode_to_vec().is_err());
    }
}
