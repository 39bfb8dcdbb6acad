use bp128_core::codec::BitPacker;
use bp128_core::format::{BitPlane, Block, PACKER_SCALAR};
use bp128_core::{pack, unpack};

/// Portable bit-plane packer: one lane and one bit at a time.
///
/// Runs on every target and defines the layout the other backends must
/// reproduce bit for bit.
pub struct ScalarPacker;

impl BitPacker for ScalarPacker {
    fn id(&self) -> u16 {
        PACKER_SCALAR
    }

    fn name(&self) -> &'static str {
        "scalar"
    }

    fn pack_into(&self, values: &Block, bit_width: u8, out: &mut [BitPlane]) {
        pack::pack_into(values, bit_width, out);
    }

    fn unpack_into(&self, planes: &[BitPlane], bit_width: u8, out: &mut Block) {
        unpack::unpack_into(planes, bit_width, out);
    }
}
