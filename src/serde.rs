use crate::cue::Cue;
use crate::descriptors::{DescriptorBody, SegmentationDescriptor, SpliceDescriptor};
use crate::info::{EncryptionAlgorithm, InfoSection};
use crate::upid::Upid;
use data_encoding::HEXLOWER;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt::LowerHex;

#[inline]
fn as_hex<T>(value: T) -> String
where
    T: LowerHex,
{
    format!("0x{:02x}", value)
}

#[inline]
fn bytes_as_hex(data: &[u8]) -> String {
    format!("0x{}", HEXLOWER.encode(data))
}

impl Serialize for Cue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Cue", 6)?;
        state.serialize_field("info_section", &self.info)?;
        state.serialize_field("splice_command", &bytes_as_hex(&self.splice_command))?;
        state.serialize_field("descriptor_loop_length", &self.descriptor_loop_length)?;
        state.serialize_field("descriptors", &self.descriptors)?;
        state.serialize_field("crc_32", &format!("0x{:08x}", self.crc_32))?;
        state.serialize_field("crc_valid", &self.crc_valid)?;
        state.end()
    }
}

impl Serialize for InfoSection {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("InfoSection", 15)?;
        state.serialize_field("table_id", &as_hex(self.table_id))?;
        state.serialize_field("section_syntax_indicator", &self.section_syntax_indicator)?;
        state.serialize_field("private_indicator", &self.private_indicator)?;
        state.serialize_field("reserved", &as_hex(self.reserved))?;
        state.serialize_field("section_length", &self.section_length)?;
        state.serialize_field("protocol_version", &self.protocol_version)?;
        state.serialize_field("encrypted_packet", &self.encrypted_packet)?;
        state.serialize_field("encryption_algorithm", &self.encryption_algorithm)?;
        state.serialize_field(
            "encryption_algorithm_name",
            &EncryptionAlgorithm::from(self.encryption_algorithm).to_string(),
        )?;
        state.serialize_field("pts_adjustment", &self.pts_adjustment)?;
        state.serialize_field("cw_index", &self.cw_index)?;
        state.serialize_field("tier", &self.tier)?;
        state.serialize_field("splice_command_length", &self.splice_command_length)?;
        state.serialize_field("splice_command_type", &self.splice_command_type)?;
        state.serialize_field("splice_command_name", &self.splice_command_name())?;
        state.end()
    }
}

impl Serialize for SpliceDescriptor {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("SpliceDescriptor", 24)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("splice_descriptor_tag", &as_hex(self.tag()))?;
        state.serialize_field("descriptor_length", &self.descriptor_length)?;
        state.serialize_field("identifier", &self.identifier_text())?;

        match &self.body {
            DescriptorBody::Avail(avail) => {
                state.serialize_field("provider_avail_id", &avail.provider_avail_id)?;
            }
            DescriptorBody::Dtmf(dtmf) => {
                state.serialize_field("preroll", &dtmf.preroll)?;
                state.serialize_field("dtmf_count", &dtmf.dtmf_count)?;
                state.serialize_field("dtmf_chars", &dtmf.dtmf_string())?;
            }
            DescriptorBody::Segmentation(segmentation) => {
                serialize_segmentation::<S>(segmentation, &mut state)?;
            }
            DescriptorBody::Time(time) => {
                state.serialize_field("tai_seconds", &time.tai_seconds)?;
                state.serialize_field("tai_ns", &time.tai_ns)?;
                state.serialize_field("utc_offset", &time.utc_offset)?;
            }
            DescriptorBody::Audio(audio) => {
                state.serialize_field("components", &audio.components)?;
            }
        }
        state.end()
    }
}

fn serialize_segmentation<S>(
    segmentation: &SegmentationDescriptor,
    state: &mut S::SerializeStruct,
) -> Result<(), S::Error>
where
    S: Serializer,
{
    state.serialize_field("segmentation_event_id", &segmentation.segmentation_event_id)?;
    state.serialize_field(
        "segmentation_event_cancel_indicator",
        &segmentation.segmentation_event_cancel_indicator(),
    )?;

    let Some(event) = &segmentation.event else {
        return Ok(());
    };

    state.serialize_field("program_segmentation_flag", &event.program_segmentation_flag())?;
    state.serialize_field(
        "segmentation_duration_flag",
        &event.segmentation_duration_flag(),
    )?;
    state.serialize_field(
        "delivery_not_restricted_flag",
        &event.delivery_not_restricted_flag(),
    )?;
    if let Some(restrictions) = &event.delivery_restrictions {
        state.serialize_field(
            "web_delivery_allowed_flag",
            &restrictions.web_delivery_allowed_flag,
        )?;
        state.serialize_field(
            "no_regional_blackout_flag",
            &restrictions.no_regional_blackout_flag,
        )?;
        state.serialize_field("archive_allowed_flag", &restrictions.archive_allowed_flag)?;
        state.serialize_field(
            "device_restrictions",
            restrictions.device_restrictions_label(),
        )?;
    }
    if let Some(components) = &event.components {
        state.serialize_field("components", components)?;
    }
    if let Some(duration) = event.segmentation_duration {
        state.serialize_field("segmentation_duration", &duration)?;
    }
    state.serialize_field(
        "segmentation_upid_type",
        &as_hex(event.segmentation_upid.upid_type()),
    )?;
    state.serialize_field(
        "segmentation_upid_type_name",
        event.segmentation_upid.name(),
    )?;
    state.serialize_field(
        "segmentation_upid_length",
        &event.segmentation_upid.encoded_len(),
    )?;
    state.serialize_field("segmentation_upid", &event.segmentation_upid)?;
    state.serialize_field("segmentation_type_id", &as_hex(event.segmentation_type_id))?;
    if let Some(message) = event.segmentation_message() {
        state.serialize_field("segmentation_message", message)?;
    }
    state.serialize_field("segment_num", &event.segment_num)?;
    state.serialize_field("segments_expected", &event.segments_expected)?;
    if let Some(sub) = &event.sub_segment {
        state.serialize_field("sub_segment_num", &sub.sub_segment_num)?;
        state.serialize_field("sub_segments_expected", &sub.sub_segments_expected)?;
    }
    Ok(())
}

impl Serialize for Upid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Upid", 6)?;
        state.serialize_field("name", self.name())?;
        state.serialize_field("upid_type", &as_hex(self.upid_type()))?;

        match self {
            Upid::Text { value, .. } | Upid::AiringId { value, .. } => {
                state.serialize_field("value", value)?;
            }
            Upid::Atsc(atsc) => {
                state.serialize_field("tsid", &atsc.tsid)?;
                state.serialize_field("end_of_day", &atsc.end_of_day)?;
                state.serialize_field("unique_for", &atsc.unique_for)?;
                state.serialize_field("content_id", &bytes_as_hex(&atsc.content_id))?;
            }
            Upid::Eidr(value) => {
                state.serialize_field("value", value)?;
            }
            Upid::Mpu(mpu) => {
                state.serialize_field("format_identifier", &mpu.format_identifier)?;
                state.serialize_field("private_data", &bytes_as_hex(&mpu.private_data))?;
            }
            Upid::Mid(upids) => {
                state.serialize_field("upids", upids)?;
            }
            Upid::Isan { data, .. } | Upid::Unknown { data, .. } => {
                state.serialize_field("value", &String::from_utf8_lossy(data))?;
                state.serialize_field("data", &bytes_as_hex(data))?;
            }
        }
        state.end()
    }
}
