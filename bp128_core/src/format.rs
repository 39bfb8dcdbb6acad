use crate::error::PackError;

/// Number of values in a block.
pub const BLOCK_LEN: usize = 128;

/// Largest bit width a block can be packed at.
pub const MAX_BIT_WIDTH: u8 = 32;

/// Serialized size of one bit plane in bytes.
pub const PLANE_BYTES: usize = 16;

/// Serialized size of a block packed at `MAX_BIT_WIDTH`.
pub const MAX_PACKED_BYTES: usize = MAX_BIT_WIDTH as usize * PLANE_BYTES;

// ── Packer IDs ─────────────────────────────────────────────────────────────

pub const PACKER_SCALAR: u16 = 0;
pub const PACKER_SSE2: u16 = 1;

// ── Types ──────────────────────────────────────────────────────────────────

/// A fixed group of 128 unsigned 32-bit integers, the unit of packing.
pub type Block = [u32; BLOCK_LEN];

/// One 128-bit word of a packed buffer.
///
/// Bit `i` of plane `p` holds bit `p` of the value in lane `i`.
pub type BitPlane = u128;

/// Size in bytes of a block packed at `bit_width`.
#[inline]
pub const fn packed_len(bit_width: u8) -> usize {
    bit_width as usize * PLANE_BYTES
}

/// Borrow a slice as a block, rejecting any length other than `BLOCK_LEN`.
pub fn block_from_slice(values: &[u32]) -> Result<&Block, PackError> {
    values
        .try_into()
        .map_err(|_| PackError::BlockLength(values.len()))
}

pub(crate) fn check_bit_width(bit_width: u8) -> Result<(), PackError> {
    if bit_width > MAX_BIT_WIDTH {
        return Err(PackError::InvalidBitWidth(bit_width));
    }
    Ok(())
}

// ── Serialization ──────────────────────────────────────────────────────────

/// Serialize planes as consecutive 16-byte units in native byte order.
///
/// The bit width is not written; callers store it out-of-band.
pub fn planes_to_bytes(planes: &[BitPlane]) -> Vec<u8> {
    let mut buf = Vec::with_capacity(planes.len() * PLANE_BYTES);
    for plane in planes {
        buf.extend_from_slice(&plane.to_ne_bytes());
    }
    buf
}

/// Deserialize planes written by [`planes_to_bytes`].
///
/// `bytes` must hold exactly `bit_width` planes.
pub fn planes_from_bytes(bytes: &[u8], bit_width: u8) -> Result<Vec<BitPlane>, PackError> {
    check_bit_width(bit_width)?;
    let expected = packed_len(bit_width);
    if bytes.len() != expected {
        return Err(PackError::BufferMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(PLANE_BYTES)
        .map(|chunk| {
            let mut word = [0u8; PLANE_BYTES];
            word.copy_from_slice(chunk);
            BitPlane::from_ne_bytes(word)
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn packed_len_scales_by_plane() {
        assert_eq!(packed_len(0), 0);
        assert_eq!(packed_len(1), 16);
        assert_eq!(packed_len(MAX_BIT_WIDTH), MAX_PACKED_BYTES);
    }

    #[test]
    fn block_from_slice_rejects_short_input() {
        let short = vec![1u32; 127];
        assert_eq!(block_from_slice(&short), Err(PackError::BlockLength(127)));
        let exact = vec![1u32; BLOCK_LEN];
        assert!(block_from_slice(&exact).is_ok());
    }

    #[test]
    fn planes_from_bytes_checks_length() {
        let err = planes_from_bytes(&[0u8; 20], 1).unwrap_err();
        assert_eq!(err, PackError::BufferMismatch { expected: 16, actual: 20 });
        assert_eq!(
            planes_from_bytes(&[], 33).unwrap_err(),
            PackError::InvalidBitWidth(33)
        );
    }

    #[test]
    fn planes_bytes_preserve_lane_bits() {
        let planes = vec![1u128, 1u128 << 127, u128::MAX];
        let bytes = planes_to_bytes(&planes);
        assert_eq!(bytes.len(), 48);
        assert_eq!(planes_from_bytes(&bytes, 3).unwrap(), planes);
    }
}
