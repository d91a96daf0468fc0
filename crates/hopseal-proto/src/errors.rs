//! Error types for wire decoding and encoding.

use thiserror::Error;

/// Convenience alias for wire results.
pub type Result<T> = std::result::Result<T, WireError>;

/// Structural errors in framed bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Fewer bytes than the framing claims
    #[error("truncated message: expected {expected} bytes, got {actual}")]
    Truncated {
        /// Bytes the header promised
        expected: usize,
        /// Bytes actually present
        actual: usize,
    },

    /// Message exceeds the framing limit
    #[error("message too large: {size} bytes exceeds maximum of {max}")]
    TooLarge {
        /// Offending size
        size: usize,
        /// Maximum allowed
        max: usize,
    },

    /// Nonce does not fit the one-byte length prefix
    #[error("nonce too long: {len} bytes")]
    NonceTooLong {
        /// Nonce length that was supplied
        len: usize,
    },

    /// Party tag is not one of the known participants
    #[error("unknown party tag: {0:#04x}")]
    UnknownParty(u8),
}
