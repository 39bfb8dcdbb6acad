use crate::delta::delta_encode;
use crate::format::{BitPlane, Block, MAX_BIT_WIDTH};

/// Reference bit-plane packer.
///
/// Writes `bit_width` planes into `out[..bit_width]`: bit `i` of plane `p` is
/// bit `p` of `values[i]`. Bits at or above `bit_width` are dropped, so a
/// width below the block's requirement truncates deterministically.
///
/// # Panics
/// If `bit_width > 32` or `out` holds fewer than `bit_width` planes.
pub fn pack_into(values: &Block, bit_width: u8, out: &mut [BitPlane]) {
    assert!(
        bit_width <= MAX_BIT_WIDTH,
        "bit width {} exceeds {}",
        bit_width,
        MAX_BIT_WIDTH
    );
    for (p, plane) in out[..bit_width as usize].iter_mut().enumerate() {
        let mut word: BitPlane = 0;
        for (lane, &v) in values.iter().enumerate() {
            word |= (((v >> p) & 1) as BitPlane) << lane;
        }
        *plane = word;
    }
}

/// Pack `values` into a freshly allocated buffer of `bit_width` planes.
pub fn pack(values: &Block, bit_width: u8) -> Vec<BitPlane> {
    let mut out = vec![0; bit_width as usize];
    pack_into(values, bit_width, &mut out);
    out
}

/// Pack the deltas of `values` against `offset`.
pub fn pack_delta(values: &Block, offset: u32, bit_width: u8) -> Vec<BitPlane> {
    pack(&delta_encode(values, offset), bit_width)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::BLOCK_LEN;

    #[test]
    fn plane_holds_one_bit_per_lane() {
        let mut values = [0u32; BLOCK_LEN];
        values[0] = 0b01;
        values[5] = 0b10;
        values[127] = 0b11;
        let planes = pack(&values, 2);
        assert_eq!(planes[0], 1 | (1 << 127));
        assert_eq!(planes[1], (1 << 5) | (1 << 127));
    }

    #[test]
    fn zero_width_writes_nothing() {
        assert!(pack(&[0u32; BLOCK_LEN], 0).is_empty());
    }

    #[test]
    #[should_panic]
    fn width_above_32_panics() {
        pack(&[0u32; BLOCK_LEN], 33);
    }
}
