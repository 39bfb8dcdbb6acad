mod scalar;
#[cfg(target_arch = "x86_64")]
mod sse2;

pub use scalar::ScalarPacker;
#[cfg(target_arch = "x86_64")]
pub use sse2::Sse2Packer;

use bp128_core::format::{PACKER_SCALAR, PACKER_SSE2};
use bp128_core::{Backend, BitPacker};
use std::sync::Arc;

/// Resolve a packer from its numeric `id`.
pub fn packer_by_id(id: u16) -> anyhow::Result<Arc<dyn BitPacker>> {
    match id {
        PACKER_SCALAR => Ok(Arc::new(ScalarPacker)),
        PACKER_SSE2 => simd_packer().ok_or_else(|| {
            anyhow::anyhow!("packer id {} (sse2) is not available on this target", id)
        }),
        _ => anyhow::bail!("unknown packer id {}; supported: 0 (scalar), 1 (sse2)", id),
    }
}

/// Resolve a packer from a configured [`Backend`].
pub fn packer_for(backend: Backend) -> anyhow::Result<Arc<dyn BitPacker>> {
    let packer = match backend {
        Backend::Auto => best_available(),
        Backend::Scalar => Arc::new(ScalarPacker),
        Backend::Simd => simd_packer()
            .ok_or_else(|| anyhow::anyhow!("no SIMD packer is available on this target"))?,
    };
    log::debug!("selected {} packer for {:?}", packer.name(), backend);
    Ok(packer)
}

/// The fastest packer the running target supports.
pub fn best_available() -> Arc<dyn BitPacker> {
    simd_packer().unwrap_or_else(|| Arc::new(ScalarPacker))
}

#[cfg(target_arch = "x86_64")]
fn simd_packer() -> Option<Arc<dyn BitPacker>> {
    Some(Arc::new(Sse2Packer))
}

#[cfg(not(target_arch = "x86_64"))]
fn simd_packer() -> Option<Arc<dyn BitPacker>> {
    None
}
