//! `segmentation_descriptor()`, tag 0x02.
//!
//! Which fields are present depends on the flags read before them: a
//! cancelled event carries only its id, delivery restrictions replace five
//! reserved bits, components appear only for component-level segmentation,
//! and sub-segment numbers follow only the placement opportunity type ids.

use crate::bit_reader::BitReader;
use crate::encoding::{BitAccumulator, Encodable};
use crate::error::{DecodeResult, EncodeError, EncodeResult};
use crate::fmt::{format_optional, format_seconds};
use crate::tables::{device_restriction, has_sub_segments, segmentation_message};
use crate::upid::Upid;
use std::fmt::{Display, Formatter};
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::Serialize;

/// `segmentation_descriptor()`, tag 0x02.
///
/// A cancelled event carries only its id; every other field lives in
/// [`SegmentationEvent`], which is `None` exactly when
/// `segmentation_event_cancel_indicator` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationDescriptor {
    /// 32-bit event id as a hex literal, e.g. `0x4800008e`.
    pub segmentation_event_id: String,
    /// The event, absent when it is cancelled.
    pub event: Option<SegmentationEvent>,
}

/// Fields of a segmentation descriptor that is not a cancellation.
///
/// The wire flags are derived from which optional parts are present:
/// `program_segmentation_flag` is set iff `components` is `None`,
/// `segmentation_duration_flag` iff `segmentation_duration` is `Some` and
/// `delivery_not_restricted_flag` iff `delivery_restrictions` is `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentationEvent {
    pub delivery_restrictions: Option<DeliveryRestrictions>,
    /// Per-component PTS offsets, only for component mode segmentation.
    pub components: Option<Vec<SegmentationComponent>>,
    /// Duration in seconds.
    pub segmentation_duration: Option<f64>,
    pub segmentation_upid: Upid,
    pub segmentation_type_id: u8,
    pub segment_num: u8,
    pub segments_expected: u8,
    /// Present only for the placement opportunity start types, and only when
    /// the encoder wrote them.
    pub sub_segment: Option<SubSegment>,
}

/// Delivery restriction flags, present when delivery is restricted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct DeliveryRestrictions {
    pub web_delivery_allowed_flag: bool,
    pub no_regional_blackout_flag: bool,
    pub archive_allowed_flag: bool,
    /// 2-bit device restrictions code.
    pub device_restrictions: u8,
}

impl DeliveryRestrictions {
    /// Label of the device restrictions code, e.g. `"Restrict Group 1"`.
    pub fn device_restrictions_label(&self) -> &'static str {
        device_restriction(self.device_restrictions)
    }
}

/// A component tag with its PTS offset in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SegmentationComponent {
    pub component_tag: u8,
    pub pts_offset: f64,
}

/// Sub-segment numbering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct SubSegment {
    pub sub_segment_num: u8,
    pub sub_segments_expected: u8,
}

impl SegmentationDescriptor {
    /// Descriptor for a cancelled event.
    pub fn cancel(segmentation_event_id: impl Into<String>) -> Self {
        Self {
            segmentation_event_id: segmentation_event_id.into(),
            event: None,
        }
    }

    pub fn segmentation_event_cancel_indicator(&self) -> bool {
        self.event.is_none()
    }

    /// Decodes the descriptor body that follows the identifier. `end` is the
    /// bit offset where the descriptor's declared length ends.
    pub(crate) fn decode(reader: &mut BitReader, end: usize) -> DecodeResult<Self> {
        let segmentation_event_id = reader.read_hex(32)?;
        let cancel = reader.read_flag()?;
        reader.skip_bits(7)?;
        trace!(%segmentation_event_id, cancel, "segmentation event");

        if cancel {
            return Ok(Self::cancel(segmentation_event_id));
        }

        let program_segmentation_flag = reader.read_flag()?;
        let segmentation_duration_flag = reader.read_flag()?;
        let delivery_not_restricted_flag = reader.read_flag()?;

        let delivery_restrictions = if delivery_not_restricted_flag {
            reader.skip_bits(5)?;
            None
        } else {
            Some(DeliveryRestrictions {
                web_delivery_allowed_flag: reader.read_flag()?,
                no_regional_blackout_flag: reader.read_flag()?,
                archive_allowed_flag: reader.read_flag()?,
                device_restrictions: reader.read_bits(2)? as u8,
            })
        };

        let components = if program_segmentation_flag {
            None
        } else {
            let count = reader.read_bits(8)? as usize;
            let mut components = Vec::with_capacity(count);
            for _ in 0..count {
                let component_tag = reader.read_bits(8)? as u8;
                reader.skip_bits(7)?;
                let pts_offset = reader.read_90k(33)?;
                components.push(SegmentationComponent {
                    component_tag,
                    pts_offset,
                });
            }
            Some(components)
        };

        let segmentation_duration = if segmentation_duration_flag {
            Some(reader.read_90k(40)?)
        } else {
            None
        };

        let upid_type = reader.read_bits(8)? as u8;
        let upid_length = reader.read_bits(8)? as u8;
        let segmentation_upid = Upid::decode(reader, upid_type, upid_length)?;

        let segmentation_type_id = reader.read_bits(8)? as u8;
        if segmentation_message(segmentation_type_id).is_none() {
            debug!(segmentation_type_id, "segmentation type id has no known message");
        }
        let segment_num = reader.read_bits(8)? as u8;
        let segments_expected = reader.read_bits(8)? as u8;

        let sub_segment = if !has_sub_segments(segmentation_type_id) {
            None
        } else if end.saturating_sub(reader.offset()) >= 16 {
            Some(SubSegment {
                sub_segment_num: reader.read_bits(8)? as u8,
                sub_segments_expected: reader.read_bits(8)? as u8,
            })
        } else {
            debug!(
                segmentation_type_id,
                "descriptor length leaves no room for sub-segment fields, omitting them"
            );
            None
        };

        Ok(Self {
            segmentation_event_id,
            event: Some(SegmentationEvent {
                delivery_restrictions,
                components,
                segmentation_duration,
                segmentation_upid,
                segmentation_type_id,
                segment_num,
                segments_expected,
                sub_segment,
            }),
        })
    }

    /// Body size in bytes, excluding the identifier.
    pub(crate) fn encoded_len(&self) -> usize {
        let Some(event) = &self.event else {
            return 5;
        };
        5 + 1
            + event.components.as_ref().map_or(0, |c| 1 + 6 * c.len())
            + event.segmentation_duration.map_or(0, |_| 5)
            + 2
            + event.segmentation_upid.encoded_len()
            + 3
            + event.sub_segment.map_or(0, |_| 2)
    }
}

impl SegmentationEvent {
    pub fn program_segmentation_flag(&self) -> bool {
        self.components.is_none()
    }

    pub fn segmentation_duration_flag(&self) -> bool {
        self.segmentation_duration.is_some()
    }

    pub fn delivery_not_restricted_flag(&self) -> bool {
        self.delivery_restrictions.is_none()
    }

    /// Message for `segmentation_type_id`, if the id is a known one.
    pub fn segmentation_message(&self) -> Option<&'static str> {
        segmentation_message(self.segmentation_type_id)
    }
}

impl Encodable for SegmentationDescriptor {
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()> {
        acc.append_hex_literal("segmentation_event_id", &self.segmentation_event_id, 32)?;
        acc.append_flag(self.segmentation_event_cancel_indicator());
        acc.reserved(7);

        let Some(event) = &self.event else {
            return Ok(());
        };

        acc.append_flag(event.program_segmentation_flag());
        acc.append_flag(event.segmentation_duration_flag());
        acc.append_flag(event.delivery_not_restricted_flag());
        match &event.delivery_restrictions {
            Some(restrictions) => {
                acc.append_flag(restrictions.web_delivery_allowed_flag);
                acc.append_flag(restrictions.no_regional_blackout_flag);
                acc.append_flag(restrictions.archive_allowed_flag);
                acc.append_bits(
                    "device_restrictions",
                    restrictions.device_restrictions as u64,
                    2,
                )?;
            }
            None => acc.reserved(5),
        }

        if let Some(components) = &event.components {
            let count = u8::try_from(components.len()).map_err(|_| EncodeError::InvalidLength {
                field: "component_count",
                length: components.len(),
            })?;
            acc.append_bits("component_count", count as u64, 8)?;
            for component in components {
                acc.append_bits("component_tag", component.component_tag as u64, 8)?;
                acc.reserved(7);
                acc.append_timestamp_90k("pts_offset", component.pts_offset, 33)?;
            }
        }

        if let Some(duration) = event.segmentation_duration {
            acc.append_timestamp_90k("segmentation_duration", duration, 40)?;
        }

        let upid = event.segmentation_upid.encode_to_vec()?;
        let upid_length = u8::try_from(upid.len()).map_err(|_| EncodeError::InvalidLength {
            field: "segmentation_upid_length",
            length: upid.len(),
        })?;
        acc.append_bits(
            "segmentation_upid_type",
            event.segmentation_upid.upid_type() as u64,
            8,
        )?;
        acc.append_bits("segmentation_upid_length", upid_length as u64, 8)?;
        acc.append_slice(&upid);

        acc.append_bits("segmentation_type_id", event.segmentation_type_id as u64, 8)?;
        acc.append_bits("segment_num", event.segment_num as u64, 8)?;
        acc.append_bits("segments_expected", event.segments_expected as u64, 8)?;
        if let Some(sub) = &event.sub_segment {
            acc.append_bits("sub_segment_num", sub.sub_segment_num as u64, 8)?;
            acc.append_bits("sub_segments_expected", sub.sub_segments_expected as u64, 8)?;
        }

        Ok(())
    }
}

impl Display for SegmentationDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "    Event ID: {}", self.segmentation_event_id)?;
        let Some(event) = &self.event else {
            return writeln!(f, "    Cancelled: true");
        };

        writeln!(
            f,
            "    Type: 0x{:02x} ({})",
            event.segmentation_type_id,
            event.segmentation_message().unwrap_or("Unknown")
        )?;
        writeln!(f, "    Segment: {}/{}", event.segment_num, event.segments_expected)?;
        if let Some(sub) = &event.sub_segment {
            writeln!(
                f,
                "    Sub-segment: {}/{}",
                sub.sub_segment_num, sub.sub_segments_expected
            )?;
        }
        writeln!(
            f,
            "    Duration: {}",
            format_optional(event.segmentation_duration.map(format_seconds))
        )?;
        match &event.delivery_restrictions {
            Some(r) => writeln!(
                f,
                "    Delivery restricted: web={} no_regional_blackout={} archive={} devices={}",
                r.web_delivery_allowed_flag,
                r.no_regional_blackout_flag,
                r.archive_allowed_flag,
                r.device_restrictions_label()
            )?,
            None => writeln!(f, "    Delivery restricted: false")?,
        }
        if let Some(components) = &event.components {
            for component in components {
                writeln!(
                    f,
                    "    Component 0x{:02x}: pts_offset {}",
                    component.component_tag,
                    format_seconds(component.pts_offset)
                )?;
            }
        }
        writeln!(
            f,
            "    UPID ({}, 0x{:02x}): {}",
            event.segmentation_upid.name(),
            event.segmentation_upid.upid_type(),
            event.segmentation_upid
        )
    }
}
