use crate::delta::prefix_sum;
use crate::format::{BitPlane, Block, BLOCK_LEN, MAX_BIT_WIDTH};

/// Reference bit-plane unpacker.
///
/// Lane `i` of the result gathers bit `i` of each of the first `bit_width`
/// planes. A zero width yields an all-zero block.
///
/// # Panics
/// If `bit_width > 32` or `planes` holds fewer than `bit_width` planes.
pub fn unpack_into(planes: &[BitPlane], bit_width: u8, out: &mut Block) {
    assert!(
        bit_width <= MAX_BIT_WIDTH,
        "bit width {} exceeds {}",
        bit_width,
        MAX_BIT_WIDTH
    );
    *out = [0; BLOCK_LEN];
    for (p, &plane) in planes[..bit_width as usize].iter().enumerate() {
        for (lane, v) in out.iter_mut().enumerate() {
            *v |= (((plane >> lane) & 1) as u32) << p;
        }
    }
}

pub fn unpack(planes: &[BitPlane], bit_width: u8) -> Block {
    let mut out = [0u32; BLOCK_LEN];
    unpack_into(planes, bit_width, &mut out);
    out
}

/// Unpack deltas and rebuild the values as a running sum seeded by `offset`.
pub fn unpack_delta(planes: &[BitPlane], bit_width: u8, offset: u32) -> Block {
    let mut out = unpack(planes, bit_width);
    prefix_sum(&mut out, offset);
    out
}
