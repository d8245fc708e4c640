//! Decoding and encoding of SCTE-35 splice info sections.
//!
//! A [`Cue`] is decoded from raw bytes, base64 or hex. Its header is an
//! [`InfoSection`], the splice command body is kept as raw bytes and the
//! descriptor loop is decoded into [`SpliceDescriptor`]s, including the
//! segmentation descriptor and its [`Upid`]. Every decoded value can be
//! encoded back; lengths and the CRC-32 are recomputed on the way out.
//!
//! ```rust
//! use scte35_cue::{Cue, DescriptorBody};
//!
//! let cue: Cue = "/DAgAAAAAAAAAP/wBQb+Qjo1vQAKAAhDVUVJAAAE0iVuWvA=".parse()?;
//! assert_eq!(cue.info.splice_command_type, 0x06);
//! assert!(matches!(cue.descriptors[0].body, DescriptorBody::Avail(_)));
//! assert_eq!(cue.to_base64()?, "/DAgAAAAAAAAAP/wBQb+Qjo1vQAKAAhDVUVJAAAE0iVuWvA=");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Features
//!
//! - `crc-validation` (default): a CRC-32 mismatch fails decoding. Without
//!   it the mismatch is logged and reported in [`Cue::crc_valid`].
//! - `serde` (default): `Serialize` for every decoded value.
//! - `cli`: the `scte35-cue` command line decoder.

pub mod bit_reader;
pub mod crc;
pub mod cue;
pub mod descriptors;
pub mod encoding;
pub mod error;
pub mod fmt;
pub mod info;
pub mod tables;
pub mod upid;

#[cfg(feature = "serde")]
mod serde;

pub use bit_reader::BitReader;
pub use cue::Cue;
pub use descriptors::{
    AudioComponent, AudioDescriptor, AvailDescriptor, DeliveryRestrictions, DescriptorBody,
    DtmfDescriptor, SegmentationComponent, SegmentationDescriptor, SegmentationEvent,
    SpliceDescriptor, SubSegment, TimeDescriptor,
};
pub use encoding::{BitAccumulator, Encodable};
pub use error::{DecodeError, DecodeResult, EncodeError, EncodeResult};
pub use info::{EncryptionAlgorithm, InfoSection};
pub use upid::{AtscContentId, ManagedPrivateUpid, Upid};
