//! Error type for the checked entry points of the codec.
//!
//! The raw pack/unpack functions are infallible and trust the caller's bit
//! width. Only the checked paths (explicit widths under `WidthPolicy::Verify`,
//! deserialization, slice conversion) report errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PackError {
    #[error("bit width {0} exceeds the maximum of 32")]
    InvalidBitWidth(u8),

    #[error("bit width {supplied} is too small: block requires {required} bits")]
    WidthTooSmall { supplied: u8, required: u8 },

    #[error("packed buffer length mismatch: expected {expected} bytes, got {actual}")]
    BufferMismatch { expected: usize, actual: usize },

    #[error("block length mismatch: expected 128 values, got {0}")]
    BlockLength(usize),
}
