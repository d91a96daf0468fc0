//! Payload fingerprints using SHA-256

use std::fmt;

use sha2::{Digest, Sha256};

use crate::error::CryptoError;

/// Fingerprint size in bytes
pub const FINGERPRINT_SIZE: usize = 32;

/// Fixed-size digest standing in for a payload of any length.
///
/// Immutable once computed. Two fingerprints match only if every byte is
/// equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_SIZE]);

impl Fingerprint {
    /// Hash `bytes` into a fingerprint.
    pub fn of(bytes: &[u8]) -> Self {
        Self(Sha256::digest(bytes).into())
    }

    /// Rebuild a fingerprint received from a peer.
    ///
    /// # Errors
    ///
    /// - `InvalidInputLength` unless `bytes` is exactly 32 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, CryptoError> {
        let digest: [u8; FINGERPRINT_SIZE] =
            bytes.try_into().map_err(|_| CryptoError::InvalidInputLength {
                field: "fingerprint",
                expected: FINGERPRINT_SIZE,
                actual: bytes.len(),
            })?;
        Ok(Self(digest))
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_SIZE] {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({self})")
    }
}
