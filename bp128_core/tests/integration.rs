/// Integration tests for the width / pack / unpack pipeline.
///
/// Each property is checked against the reference functions and against every
/// backend available on the running target.
use std::sync::Arc;

use bp128_codecs::{best_available, ScalarPacker};
use bp128_core::batch::{decode_blocks, encode_blocks, payload_bytes, split_blocks};
use bp128_core::format::packed_len;
use bp128_core::width::bits_needed;
use bp128_core::{
    max_bits, max_bits_delta, pack, pack_delta, unpack, unpack_delta, BitPacker, Block, BlockMeta,
    PackConfig, PackError, PackedBlock, WidthPolicy, BLOCK_LEN,
};

/// Generate a block of deterministic values using a simple LCG.
fn pseudo_random_block(seed: u64) -> Block {
    let mut rng = seed;
    let mut block = [0u32; BLOCK_LEN];
    for v in block.iter_mut() {
        rng = rng
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *v = (rng >> 32) as u32;
    }
    block
}

/// Strictly increasing block: `start, start + 1, ..., start + 127`.
fn consecutive_block(start: u32) -> Block {
    let mut block = [0u32; BLOCK_LEN];
    for (i, v) in block.iter_mut().enumerate() {
        *v = start + i as u32;
    }
    block
}

// ── helpers ───────────────────────────────────────────────────────────────

fn packers() -> Vec<Arc<dyn BitPacker>> {
    let mut packers: Vec<Arc<dyn BitPacker>> = vec![Arc::new(ScalarPacker)];
    let best = best_available();
    if best.id() != packers[0].id() {
        packers.push(best);
    }
    packers
}

// ── tests ──────────────────────────────────────────────────────────────────

#[test]
fn test_roundtrip_plain() {
    for seed in 0..8u64 {
        let mut block = pseudo_random_block(seed);
        // Narrow some blocks so several widths are exercised.
        let shift = (seed * 4) as u32;
        for v in block.iter_mut() {
            *v >>= shift;
        }
        let b = max_bits(&block);
        assert_eq!(unpack(&pack(&block, b), b), block);

        for packer in packers() {
            let packed = PackedBlock::encode(packer.as_ref(), &block);
            assert_eq!(packed.bit_width(), b);
            assert_eq!(packed.decode(packer.as_ref()), block, "backend {}", packer.name());
        }
    }
}

#[test]
fn test_roundtrip_delta() {
    let offsets = [0u32, 1, 12_345, u32::MAX];
    for seed in 0..4u64 {
        let block = pseudo_random_block(seed);
        for &offset in &offsets {
            let b = max_bits_delta(&block, offset);
            assert_eq!(unpack_delta(&pack_delta(&block, offset, b), b, offset), block);

            for packer in packers() {
                let packed = PackedBlock::encode_delta(packer.as_ref(), &block, offset);
                assert_eq!(packed.meta(), BlockMeta::delta(b, offset));
                assert_eq!(packed.decode(packer.as_ref()), block, "backend {}", packer.name());
            }
        }
    }
}

/// The analyzer's width round-trips and one bit less does not.
#[test]
fn test_width_is_minimal() {
    for seed in 0..16u64 {
        let mut block = pseudo_random_block(seed);
        let shift = (seed * 2) as u32;
        for v in block.iter_mut() {
            *v >>= shift;
        }
        let b = max_bits(&block);
        assert!(b > 0);
        assert_eq!(unpack(&pack(&block, b), b), block);
        assert_ne!(unpack(&pack(&block, b - 1), b - 1), block, "width {} should be required", b);
    }
}

#[test]
fn test_zero_block() {
    let zeros = [0u32; BLOCK_LEN];
    assert_eq!(max_bits(&zeros), 0);
    assert!(pack(&zeros, 0).is_empty());
    assert_eq!(unpack(&[], 0), zeros);

    for packer in packers() {
        let packed = PackedBlock::encode(packer.as_ref(), &zeros);
        assert_eq!(packed.payload_len(), 0);
        assert!(packed.to_bytes().is_empty());
        assert_eq!(packed.decode(packer.as_ref()), zeros);
    }
}

#[test]
fn test_constant_block_delta_width_zero() {
    let block = [777u32; BLOCK_LEN];
    let packed = PackedBlock::encode_delta(&ScalarPacker, &block, 777);
    assert_eq!(packed.bit_width(), 0);
    assert_eq!(packed.decode(&ScalarPacker), block);
}

/// Consecutive values delta-pack into a single plane while plain packing needs
/// the full magnitude of the largest value.
#[test]
fn test_monotonic_delta_advantage() {
    for &offset in &[0u32, 1_000, 1 << 20, 3_000_000_000] {
        let block = consecutive_block(offset);
        let delta_width = max_bits_delta(&block, offset);
        assert_eq!(delta_width, 1);
        assert_eq!(packed_len(delta_width), 16);

        let expected_plain = bits_needed(offset + 127);
        assert_eq!(max_bits(&block), expected_plain);

        let packed = PackedBlock::encode_delta(&ScalarPacker, &block, offset);
        assert_eq!(packed.to_bytes().len(), 16);
        assert_eq!(packed.decode(&ScalarPacker), block);
    }
}

#[test]
fn test_block_with_max_value_needs_32_bits() {
    let mut block = pseudo_random_block(99);
    block[64] = 0xFFFF_FFFF;
    assert_eq!(max_bits(&block), 32);
    for packer in packers() {
        let packed = PackedBlock::encode(packer.as_ref(), &block);
        assert_eq!(packed.payload_len(), 512);
        assert_eq!(packed.decode(packer.as_ref()), block);
    }
}

/// Packing one bit short drops the same high bit on every run.
#[test]
fn test_truncation_is_deterministic() {
    let mut block = [0u32; BLOCK_LEN];
    for (i, v) in block.iter_mut().enumerate() {
        *v = (i as u32 * 37) % 300;
    }
    let b = max_bits(&block);
    let first = pack(&block, b - 1);
    let second = pack(&block, b - 1);
    assert_eq!(first, second);

    let truncated = unpack(&first, b - 1);
    let mask = (1u32 << (b - 1)) - 1;
    for (got, want) in truncated.iter().zip(block.iter()) {
        assert_eq!(*got, want & mask);
    }
}

#[test]
fn test_verify_policy_rejects_narrow_width() {
    let block = consecutive_block(500);
    let err = PackedBlock::encode_with_width(&ScalarPacker, &block, None, 8, WidthPolicy::Verify)
        .unwrap_err();
    assert_eq!(err, PackError::WidthTooSmall { supplied: 8, required: 10 });

    let trusted =
        PackedBlock::encode_with_width(&ScalarPacker, &block, None, 8, WidthPolicy::Trust).unwrap();
    assert_eq!(trusted.bit_width(), 8);
    assert_eq!(trusted.decode(&ScalarPacker)[0], 500 & 0xFF);
}

#[test]
fn test_wider_than_needed_width_roundtrips() {
    let block = consecutive_block(500);
    let packed =
        PackedBlock::encode_with_width(&ScalarPacker, &block, Some(499), 20, WidthPolicy::Verify)
            .unwrap();
    assert_eq!(packed.payload_len(), 320);
    assert_eq!(packed.decode(&ScalarPacker), block);
}

/// Consecutive values need 1 delta bit but 10 plain bits; the delta check must
/// use the delta requirement.
#[test]
fn test_verify_policy_uses_delta_requirement() {
    let block = consecutive_block(500);
    let err =
        PackedBlock::encode_with_width(&ScalarPacker, &block, Some(499), 0, WidthPolicy::Verify)
            .unwrap_err();
    assert_eq!(err, PackError::WidthTooSmall { supplied: 0, required: 1 });

    for packer in packers() {
        let packed = PackedBlock::encode_with_width(
            packer.as_ref(),
            &block,
            Some(499),
            1,
            WidthPolicy::Verify,
        )
        .unwrap();
        assert_eq!(packed.meta(), BlockMeta::delta(1, 499));
        assert_eq!(packed.payload_len(), 16);
        assert_eq!(packed.decode(packer.as_ref()), block);
    }
}

#[test]
fn test_verify_policy_rejects_narrow_delta_on_descending_block() {
    // Value 64 falls below its predecessor, so its delta wraps.
    let mut block = consecutive_block(10);
    block[64] = 9;
    assert_eq!(max_bits_delta(&block, 9), 32);
    for width in [0u8, 1, 16, 31] {
        let err = PackedBlock::encode_with_width(
            &ScalarPacker,
            &block,
            Some(9),
            width,
            WidthPolicy::Verify,
        )
        .unwrap_err();
        assert_eq!(err, PackError::WidthTooSmall { supplied: width, required: 32 });
    }
    let packed =
        PackedBlock::encode_with_width(&ScalarPacker, &block, Some(9), 32, WidthPolicy::Verify)
            .unwrap();
    assert_eq!(packed.decode(&ScalarPacker), block);
}

#[test]
fn test_width_above_32_is_rejected() {
    let block = [1u32; BLOCK_LEN];
    for policy in [WidthPolicy::Verify, WidthPolicy::Trust] {
        let err =
            PackedBlock::encode_with_width(&ScalarPacker, &block, None, 33, policy).unwrap_err();
        assert_eq!(err, PackError::InvalidBitWidth(33));
    }
}

#[test]
fn test_bytes_roundtrip_through_meta() {
    let block = pseudo_random_block(5);
    let packed = PackedBlock::encode_delta(&ScalarPacker, &block, 17);
    let bytes = packed.to_bytes();
    assert_eq!(bytes.len(), packed.payload_len());

    let restored = PackedBlock::from_bytes(packed.meta(), &bytes).unwrap();
    assert_eq!(restored, packed);
    assert_eq!(restored.decode(&ScalarPacker), block);

    let err = PackedBlock::from_bytes(packed.meta(), &bytes[..bytes.len() - 1]).unwrap_err();
    assert!(matches!(err, PackError::BufferMismatch { .. }));
}

#[test]
fn test_batch_preserves_order_and_chains_offsets() {
    let values: Vec<u32> = (0..10 * BLOCK_LEN as u32 + 50).map(|i| 1_000 + i * 3).collect();
    let (blocks, rest) = split_blocks(&values);
    assert_eq!(blocks.len(), 10);
    assert_eq!(rest, &values[10 * BLOCK_LEN..]);

    let config = PackConfig {
        initial_offset: 997,
        ..PackConfig::delta()
    };
    for packer in packers() {
        let packed = encode_blocks(packer.as_ref(), &blocks, &config).unwrap();
        assert_eq!(packed.len(), blocks.len());
        // Every delta is 3, including across block boundaries.
        assert!(packed.iter().all(|p| p.bit_width() == 2));
        assert_eq!(packed[0].meta().offset, Some(997));
        assert_eq!(packed[3].meta().offset, Some(blocks[2][BLOCK_LEN - 1]));
        assert_eq!(payload_bytes(&packed), 10 * 2 * 16);

        let decoded = decode_blocks(packer.as_ref(), &packed);
        assert_eq!(decoded, blocks);
    }
}

#[test]
fn test_batch_fixed_width_follows_policy() {
    let blocks = vec![consecutive_block(500), consecutive_block(100)];
    let verify = PackConfig {
        bit_width: Some(8),
        ..PackConfig::default()
    };
    let err = encode_blocks(&ScalarPacker, &blocks, &verify).unwrap_err();
    assert_eq!(err, PackError::WidthTooSmall { supplied: 8, required: 10 });

    let trust = PackConfig {
        width_policy: WidthPolicy::Trust,
        ..verify.clone()
    };
    let packed = encode_blocks(&ScalarPacker, &blocks, &trust).unwrap();
    assert!(packed.iter().all(|p| p.bit_width() == 8));
    let decoded = decode_blocks(&ScalarPacker, &packed);
    assert_eq!(decoded[0][0], 500 & 0xFF);
    assert_eq!(decoded[1], blocks[1]);

    let wide = PackConfig {
        bit_width: Some(12),
        ..verify
    };
    let packed = encode_blocks(&ScalarPacker, &blocks, &wide).unwrap();
    assert_eq!(payload_bytes(&packed), 2 * 12 * 16);
    assert_eq!(decode_blocks(&ScalarPacker, &packed), blocks);
}

#[test]
fn test_batch_fixed_width_delta_chains_offsets() {
    let blocks = vec![consecutive_block(500), consecutive_block(628)];
    let config = PackConfig {
        initial_offset: 499,
        bit_width: Some(1),
        ..PackConfig::delta()
    };
    for packer in packers() {
        let packed = encode_blocks(packer.as_ref(), &blocks, &config).unwrap();
        assert_eq!(packed[0].meta(), BlockMeta::delta(1, 499));
        assert_eq!(packed[1].meta(), BlockMeta::delta(1, 627));
        assert_eq!(decode_blocks(packer.as_ref(), &packed), blocks);
    }

    let zero = PackConfig {
        bit_width: Some(0),
        ..config
    };
    let err = encode_blocks(&ScalarPacker, &blocks, &zero).unwrap_err();
    assert_eq!(err, PackError::WidthTooSmall { supplied: 0, required: 1 });
}

#[test]
fn test_batch_plain_mode() {
    let blocks: Vec<Block> = (0..32u64).map(pseudo_random_block).collect();
    let packer = best_available();
    let packed = encode_blocks(packer.as_ref(), &blocks, &PackConfig::default()).unwrap();
    assert!(packed.iter().all(|p| p.meta().offset.is_none()));
    assert_eq!(decode_blocks(packer.as_ref(), &packed), blocks);
}
