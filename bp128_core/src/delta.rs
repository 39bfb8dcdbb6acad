use crate::format::{Block, BLOCK_LEN};

/// Replace each value with its difference from its predecessor, using
/// `offset` as the predecessor of element 0. Subtraction wraps.
pub fn delta_encode(block: &Block, offset: u32) -> Block {
    let mut deltas = [0u32; BLOCK_LEN];
    let mut prev = offset;
    for (d, &v) in deltas.iter_mut().zip(block) {
        *d = v.wrapping_sub(prev);
        prev = v;
    }
    deltas
}

/// Inclusive running sum seeded by `offset`, in place. Inverse of
/// [`delta_encode`].
pub fn prefix_sum(deltas: &mut Block, offset: u32) {
    let mut acc = offset;
    for v in deltas.iter_mut() {
        acc = acc.wrapping_add(*v);
        *v = acc;
    }
}
