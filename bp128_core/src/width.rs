use crate::format::Block;

/// Bits needed to represent `v`: `ceil(log2(v + 1))`, zero for zero.
#[inline]
pub const fn bits_needed(v: u32) -> u8 {
    (u32::BITS - v.leading_zeros()) as u8
}

/// Minimum bit width that holds every value of `block`.
///
/// The highest set bit of the OR of all values is the highest set bit of the
/// maximum, so no comparison is needed.
pub fn max_bits(block: &Block) -> u8 {
    bits_needed(block.iter().fold(0, |acc, &v| acc | v))
}

/// Minimum bit width that holds every delta of `block`, where element 0 is
/// measured against `offset`.
///
/// Subtraction wraps, so a decreasing pair yields a large delta rather than
/// an error.
pub fn max_bits_delta(block: &Block, offset: u32) -> u8 {
    let mut prev = offset;
    let mut acc = 0u32;
    for &v in block {
        acc |= v.wrapping_sub(prev);
        prev = v;
    }
    bits_needed(acc)
}
