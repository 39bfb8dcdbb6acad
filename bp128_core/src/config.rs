//! Packing configuration shared by the batch helpers and the CLI.
//!
//! `PackConfig` is built once at the application boundary (flags or a JSON
//! file) and passed down by reference.

use serde::{Deserialize, Serialize};

/// How values are transformed before packing.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PackMode {
    /// Values are packed as they are.
    #[default]
    Plain,

    /// Each value is packed as its difference from its predecessor. Suited to
    /// sorted sequences such as document ids or timestamps.
    Delta,
}

/// What to do when a caller supplies an explicit bit width.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WidthPolicy {
    /// Recompute the block's width and reject a smaller one.
    #[default]
    Verify,

    /// Pack at the given width; high bits above it are dropped.
    Trust,
}

/// Which `BitPacker` implementation to use.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// The fastest backend the running CPU supports.
    #[default]
    Auto,
    Scalar,
    Simd,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct PackConfig {
    pub mode: PackMode,
    pub width_policy: WidthPolicy,
    pub backend: Backend,
    /// Predecessor of the first value of a delta-coded sequence.
    pub initial_offset: u32,
    /// Pack every block at this width instead of the analyzed one.
    /// Checked against each block according to `width_policy`.
    pub bit_width: Option<u8>,
}

impl PackConfig {
    pub fn delta() -> Self {
        Self {
            mode: PackMode::Delta,
            ..Self::default()
        }
    }
}
