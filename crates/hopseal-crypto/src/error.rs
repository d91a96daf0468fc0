//! Error types for cipher adapter operations

use thiserror::Error;

/// Errors from sealing, opening and key handling.
///
/// None of these are retryable: a tag that failed to verify fails the same
/// way on every attempt, and length errors are caller bugs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Tag, padding or key check failed (tampering, wrong key or wrong suite)
    #[error("authentication failed")]
    AuthenticationFailure,

    /// Nonce or ciphertext has the wrong length for the suite
    #[error("invalid {field} length: expected {expected}, got {actual}")]
    InvalidInputLength {
        /// Which input was malformed
        field: &'static str,
        /// Required length (minimum length for AEAD ciphertexts)
        expected: usize,
        /// Length that was supplied
        actual: usize,
    },

    /// Plaintext exceeds what the scheme can seal in one shot
    #[error("payload too large: {size} bytes exceeds maximum of {max}")]
    PayloadTooLarge {
        /// Plaintext size
        size: usize,
        /// Scheme limit for this key
        max: usize,
    },

    /// Key material has the wrong length
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength {
        /// Expected key length
        expected: usize,
        /// Actual key length
        actual: usize,
    },

    /// Public-key channel was asked to open without holding the private key
    #[error("no private key available to open this message")]
    MissingPrivateKey,

    /// Key generation was rejected by the primitive
    #[error("key generation failed: {reason}")]
    KeyGeneration {
        /// Reason reported by the primitive
        reason: String,
    },

    /// Cipher primitive failed for a reason other than the inputs above
    #[error("cipher primitive failed: {reason}")]
    Primitive {
        /// Reason reported by the primitive
        reason: String,
    },
}

impl CryptoError {
    /// Returns true if this error means the message was forged, corrupted or
    /// sealed under a different key.
    pub fn is_tampering(&self) -> bool {
        matches!(self, Self::AuthenticationFailure)
    }

    /// Returns true if this error is a caller bug rather than a property of
    /// the received bytes.
    pub fn is_caller_error(&self) -> bool {
        match self {
            Self::PayloadTooLarge { .. }
            | Self::InvalidKeyLength { .. }
            | Self::MissingPrivateKey
            | Self::KeyGeneration { .. } => true,

            // Received bytes are malformed or forged
            Self::AuthenticationFailure | Self::InvalidInputLength { .. } => false,

            // Local failure independent of both caller and peer
            Self::Primitive { .. } => false,
        }
    }
}
