use crate::delta::{delta_encode, prefix_sum};
use crate::format::{BitPlane, Block};

/// Out-of-band description of a packed block.
///
/// Packed buffers carry no header: the bit width, and for delta blocks the
/// offset, must be stored next to them by the caller and handed back on
/// decode.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMeta {
    pub bit_width: u8,
    /// Predecessor of element 0. `Some` exactly for delta-coded blocks.
    pub offset: Option<u32>,
}

impl BlockMeta {
    pub fn plain(bit_width: u8) -> Self {
        Self {
            bit_width,
            offset: None,
        }
    }

    pub fn delta(bit_width: u8, offset: u32) -> Self {
        Self {
            bit_width,
            offset: Some(offset),
        }
    }

    pub fn is_delta(&self) -> bool {
        self.offset.is_some()
    }
}

/// Core packing abstraction.
///
/// Each `BitPacker` implementation:
/// - Is identified by a stable numeric `id()`.
/// - Produces the same planes as every other implementation for the same
///   input, so buffers written by one backend decode with any other.
/// - Keeps no state between calls; all methods are pure and reentrant.
///
/// Widths are trusted: packing below a block's requirement truncates, and
/// unpacking with a different width than was packed yields wrong values.
pub trait BitPacker: Send + Sync {
    /// Stable backend ID.
    fn id(&self) -> u16;

    /// Human-readable backend name for CLI display.
    fn name(&self) -> &'static str;

    /// Write `bit_width` planes of `values` into `out[..bit_width]`.
    fn pack_into(&self, values: &Block, bit_width: u8, out: &mut [BitPlane]);

    /// Rebuild a block from the first `bit_width` planes.
    fn unpack_into(&self, planes: &[BitPlane], bit_width: u8, out: &mut Block);

    /// Pack the deltas of `values` against `offset`.
    fn pack_delta_into(&self, values: &Block, offset: u32, bit_width: u8, out: &mut [BitPlane]) {
        self.pack_into(&delta_encode(values, offset), bit_width, out);
    }

    /// Unpack deltas and apply the running sum seeded by `offset`.
    fn unpack_delta_into(&self, planes: &[BitPlane], bit_width: u8, offset: u32, out: &mut Block) {
        self.unpack_into(planes, bit_width, out);
        prefix_sum(out, offset);
    }
}
