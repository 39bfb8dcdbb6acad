//! SSE2 bit-plane packer for x86_64.
//!
//! A block is held as 32 vectors of 4 lanes. Packing moves bit `p` of every
//! lane into the sign position and collects 4 lanes per `movemask`. Unpacking
//! expands each 4-lane nibble of a plane through a lookup table and ORs it in
//! at bit `p`. Delta coding is fused into both directions: a shifted
//! subtraction on pack and a two-step in-register prefix sum on unpack.

use std::arch::x86_64::*;

use bp128_core::codec::BitPacker;
use bp128_core::format::{BitPlane, Block, BLOCK_LEN, MAX_BIT_WIDTH, PACKER_SSE2};

const LANES: usize = 4;
const GROUPS: usize = BLOCK_LEN / LANES;

/// `NIBBLE_LANES[n][k]` is bit `k` of `n`.
static NIBBLE_LANES: [[u32; LANES]; 16] = {
    let mut lut = [[0u32; LANES]; 16];
    let mut n = 0;
    while n < 16 {
        let mut k = 0;
        while k < LANES {
            lut[n][k] = ((n >> k) & 1) as u32;
            k += 1;
        }
        n += 1;
    }
    lut
};

/// Vectorised packer using SSE2 intrinsics.
///
/// SSE2 is part of the x86_64 baseline, so this backend is always usable on
/// that architecture.
pub struct Sse2Packer;

impl BitPacker for Sse2Packer {
    fn id(&self) -> u16 {
        PACKER_SSE2
    }

    fn name(&self) -> &'static str {
        "sse2"
    }

    fn pack_into(&self, values: &Block, bit_width: u8, out: &mut [BitPlane]) {
        let out = planes_mut(out, bit_width);
        // SAFETY: SSE2 is always present on x86_64.
        unsafe { pack_sse2(values, None, out) }
    }

    fn unpack_into(&self, planes: &[BitPlane], bit_width: u8, out: &mut Block) {
        let planes = planes_ref(planes, bit_width);
        // SAFETY: SSE2 is always present on x86_64.
        unsafe { unpack_sse2(planes, None, out) }
    }

    fn pack_delta_into(&self, values: &Block, offset: u32, bit_width: u8, out: &mut [BitPlane]) {
        let out = planes_mut(out, bit_width);
        // SAFETY: SSE2 is always present on x86_64.
        unsafe { pack_sse2(values, Some(offset), out) }
    }

    fn unpack_delta_into(&self, planes: &[BitPlane], bit_width: u8, offset: u32, out: &mut Block) {
        let planes = planes_ref(planes, bit_width);
        // SAFETY: SSE2 is always present on x86_64.
        unsafe { unpack_sse2(planes, Some(offset), out) }
    }
}

fn planes_mut(out: &mut [BitPlane], bit_width: u8) -> &mut [BitPlane] {
    assert!(bit_width <= MAX_BIT_WIDTH, "bit width {} exceeds {}", bit_width, MAX_BIT_WIDTH);
    &mut out[..bit_width as usize]
}

fn planes_ref(planes: &[BitPlane], bit_width: u8) -> &[BitPlane] {
    assert!(bit_width <= MAX_BIT_WIDTH, "bit width {} exceeds {}", bit_width, MAX_BIT_WIDTH);
    &planes[..bit_width as usize]
}

#[target_feature(enable = "sse2")]
unsafe fn pack_sse2(values: &Block, offset: Option<u32>, out: &mut [BitPlane]) {
    unsafe {
        let mut lanes = [_mm_setzero_si128(); GROUPS];
        let mut prev = _mm_set1_epi32(offset.unwrap_or(0) as i32);
        for (g, lane) in lanes.iter_mut().enumerate() {
            let v = _mm_loadu_si128(values.as_ptr().add(g * LANES) as *const __m128i);
            *lane = match offset {
                Some(_) => {
                    // [prev[3], v[0], v[1], v[2]]
                    let preceding =
                        _mm_or_si128(_mm_slli_si128::<4>(v), _mm_srli_si128::<12>(prev));
                    prev = v;
                    _mm_sub_epi32(v, preceding)
                }
                None => v,
            };
        }

        for (p, plane) in out.iter_mut().enumerate() {
            let to_sign = _mm_cvtsi32_si128(31 - p as i32);
            let mut word: BitPlane = 0;
            for (g, &v) in lanes.iter().enumerate() {
                let bits = _mm_movemask_ps(_mm_castsi128_ps(_mm_sll_epi32(v, to_sign))) as BitPlane;
                word |= bits << (g * LANES);
            }
            *plane = word;
        }
    }
}

#[target_feature(enable = "sse2")]
unsafe fn unpack_sse2(planes: &[BitPlane], offset: Option<u32>, out: &mut Block) {
    unsafe {
        let mut lanes = [_mm_setzero_si128(); GROUPS];
        for (p, &plane) in planes.iter().enumerate() {
            let shift = _mm_cvtsi32_si128(p as i32);
            for (g, acc) in lanes.iter_mut().enumerate() {
                let nibble = ((plane >> (g * LANES)) & 0xF) as usize;
                let bits = _mm_loadu_si128(NIBBLE_LANES[nibble].as_ptr() as *const __m128i);
                *acc = _mm_or_si128(*acc, _mm_sll_epi32(bits, shift));
            }
        }

        let mut carry = _mm_set1_epi32(offset.unwrap_or(0) as i32);
        for (g, &lane) in lanes.iter().enumerate() {
            let v = match offset {
                Some(_) => {
                    let mut v = _mm_add_epi32(lane, _mm_slli_si128::<4>(lane));
                    v = _mm_add_epi32(v, _mm_slli_si128::<8>(v));
                    v = _mm_add_epi32(v, carry);
                    carry = _mm_shuffle_epi32::<0xFF>(v);
                    v
                }
                None => lane,
            };
            _mm_storeu_si128(out.as_mut_ptr().add(g * LANES) as *mut __m128i, v);
        }
    }
}
