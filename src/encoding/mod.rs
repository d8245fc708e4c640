//! Binary encoding support for SCTE-35 messages.
//!
//! Encoders append their fields, in wire order, to a [`BitAccumulator`] and
//! the accumulator is finalized once into the output bytes.

/// Append-only bit buffer.
pub mod accumulator;

/// Trait definitions for encodable types.
pub mod traits;

pub use accumulator::BitAccumulator;
pub use traits::Encodable;
