use rayon::prelude::*;

use crate::block::PackedBlock;
use crate::codec::BitPacker;
use crate::config::{PackConfig, PackMode};
use crate::error::PackError;
use crate::format::{Block, BLOCK_LEN};

/// Split `values` into full blocks. The trailing values that do not fill a
/// block are returned untouched.
pub fn split_blocks(values: &[u32]) -> (Vec<Block>, &[u32]) {
    let chunks = values.chunks_exact(BLOCK_LEN);
    let rest = chunks.remainder();
    let blocks = chunks
        .map(|chunk| {
            let mut block = [0u32; BLOCK_LEN];
            block.copy_from_slice(chunk);
            block
        })
        .collect();
    (blocks, rest)
}

/// Encode every block in parallel, preserving input order.
///
/// In delta mode block `n` is coded against the last value of block `n - 1`
/// (block 0 against `config.initial_offset`). Offsets come from the input, so
/// no block waits on another.
///
/// With `config.bit_width` set every block is packed at that width, checked
/// according to `config.width_policy`; the first rejected block fails the
/// batch.
pub fn encode_blocks(
    packer: &dyn BitPacker,
    blocks: &[Block],
    config: &PackConfig,
) -> Result<Vec<PackedBlock>, PackError> {
    log::debug!(
        "encoding {} blocks with {} ({:?}, width {:?}, {:?})",
        blocks.len(),
        packer.name(),
        config.mode,
        config.bit_width,
        config.width_policy
    );
    blocks
        .par_iter()
        .enumerate()
        .map(|(i, values)| -> Result<PackedBlock, PackError> {
            let offset = match config.mode {
                PackMode::Plain => None,
                PackMode::Delta if i == 0 => Some(config.initial_offset),
                PackMode::Delta => Some(blocks[i - 1][BLOCK_LEN - 1]),
            };
            let packed = match (config.bit_width, offset) {
                (Some(width), _) => PackedBlock::encode_with_width(
                    packer,
                    values,
                    offset,
                    width,
                    config.width_policy,
                )?,
                (None, None) => PackedBlock::encode(packer, values),
                (None, Some(offset)) => PackedBlock::encode_delta(packer, values, offset),
            };
            log::trace!("block {}: width {}, offset {:?}", i, packed.bit_width(), offset);
            Ok(packed)
        })
        .collect()
}

/// Decode every block in parallel using each block's stored metadata.
pub fn decode_blocks(packer: &dyn BitPacker, packed: &[PackedBlock]) -> Vec<Block> {
    log::debug!("decoding {} blocks with {}", packed.len(), packer.name());
    packed
        .par_iter()
        .enumerate()
        .map(|(i, block)| {
            log::trace!("block {}: decoding {} planes", i, block.bit_width());
            block.decode(packer)
        })
        .collect()
}

/// Total serialized size of the planes of `packed`, excluding metadata.
pub fn payload_bytes(packed: &[PackedBlock]) -> usize {
    packed.iter().map(PackedBlock::payload_len).sum()
}
