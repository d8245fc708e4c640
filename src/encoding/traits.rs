//! Trait definitions for encodable types.

use super::accumulator::BitAccumulator;
use crate::error::EncodeResult;

/// Types that serialize themselves into SCTE-35 wire format.
pub trait Encodable {
    /// Appends the wire form of `self` to `acc`.
    fn encode(&self, acc: &mut BitAccumulator) -> EncodeResult<()>;

    /// Convenience method to encode to a new byte vector.
    fn encode_to_vec(&self) -> EncodeResult<Vec<u8>> {
        let mut acc = BitAccumulator::new();
        self.encode(&mut acc)?;
        Ok(acc.finalize())
    }
}
