pub mod batch;
pub mod block;
pub mod codec;
pub mod config;
pub mod delta;
pub mod error;
pub mod format;
pub mod pack;
pub mod unpack;
pub mod width;

pub use block::PackedBlock;
pub use codec::{BitPacker, BlockMeta};
pub use config::{Backend, PackConfig, PackMode, WidthPolicy};
pub use error::PackError;
pub use format::{BitPlane, Block, BLOCK_LEN, MAX_BIT_WIDTH, PLANE_BYTES};
pub use pack::{pack, pack_delta};
pub use unpack::{unpack, unpack_delta};
pub use width::{max_bits, max_bits_delta};
