use crate::codec::{BitPacker, BlockMeta};
use crate::config::WidthPolicy;
use crate::error::PackError;
use crate::format::{
    check_bit_width, packed_len, planes_from_bytes, planes_to_bytes, BitPlane, Block, BLOCK_LEN,
};
use crate::width::{max_bits, max_bits_delta};

/// A packed block together with the metadata needed to decode it.
///
/// Only the planes are serialized by [`to_bytes`](Self::to_bytes); the
/// `BlockMeta` is the caller's to store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedBlock {
    meta: BlockMeta,
    planes: Vec<BitPlane>,
}

impl PackedBlock {
    /// Pack `values` at the smallest width that holds them.
    pub fn encode(packer: &dyn BitPacker, values: &Block) -> Self {
        let meta = BlockMeta::plain(max_bits(values));
        Self::pack_with_meta(packer, values, meta)
    }

    /// Delta-pack `values` against `offset` at the smallest sufficient width.
    pub fn encode_delta(packer: &dyn BitPacker, values: &Block, offset: u32) -> Self {
        let meta = BlockMeta::delta(max_bits_delta(values, offset), offset);
        Self::pack_with_meta(packer, values, meta)
    }

    /// Pack at a caller-chosen width. `offset` selects delta coding.
    ///
    /// Under [`WidthPolicy::Verify`] a width below the block's requirement is
    /// rejected; under [`WidthPolicy::Trust`] it truncates the high bits.
    pub fn encode_with_width(
        packer: &dyn BitPacker,
        values: &Block,
        offset: Option<u32>,
        bit_width: u8,
        policy: WidthPolicy,
    ) -> Result<Self, PackError> {
        check_bit_width(bit_width)?;
        if policy == WidthPolicy::Verify {
            let required = match offset {
                Some(offset) => max_bits_delta(values, offset),
                None => max_bits(values),
            };
            if bit_width < required {
                return Err(PackError::WidthTooSmall {
                    supplied: bit_width,
                    required,
                });
            }
        }
        let meta = BlockMeta { bit_width, offset };
        Ok(Self::pack_with_meta(packer, values, meta))
    }

    fn pack_with_meta(packer: &dyn BitPacker, values: &Block, meta: BlockMeta) -> Self {
        let mut planes = vec![0; meta.bit_width as usize];
        match meta.offset {
            Some(offset) => packer.pack_delta_into(values, offset, meta.bit_width, &mut planes),
            None => packer.pack_into(values, meta.bit_width, &mut planes),
        }
        Self { meta, planes }
    }

    /// Rebuild the original values.
    pub fn decode(&self, packer: &dyn BitPacker) -> Block {
        let mut out = [0u32; BLOCK_LEN];
        match self.meta.offset {
            Some(offset) => {
                packer.unpack_delta_into(&self.planes, self.meta.bit_width, offset, &mut out)
            }
            None => packer.unpack_into(&self.planes, self.meta.bit_width, &mut out),
        }
        out
    }

    /// Reassemble a block from its stored metadata and serialized planes.
    pub fn from_bytes(meta: BlockMeta, bytes: &[u8]) -> Result<Self, PackError> {
        let planes = planes_from_bytes(bytes, meta.bit_width)?;
        Ok(Self { meta, planes })
    }

    /// Serialize the planes (`bit_width × 16` bytes).
    pub fn to_bytes(&self) -> Vec<u8> {
        planes_to_bytes(&self.planes)
    }

    #[inline]
    pub fn meta(&self) -> BlockMeta {
        self.meta
    }

    #[inline]
    pub fn bit_width(&self) -> u8 {
        self.meta.bit_width
    }

    #[inline]
    pub fn planes(&self) -> &[BitPlane] {
        &self.planes
    }

    /// Serialized size of the planes in bytes.
    #[inline]
    pub fn payload_len(&self) -> usize {
        packed_len(self.meta.bit_width)
    }
}
