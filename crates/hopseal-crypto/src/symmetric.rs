//! Symmetric cipher adapter over AES-256-GCM and ChaCha20-Poly1305
//!
//! Both suites share one shape: 256-bit key, 96-bit random nonce, 128-bit
//! tag appended to the ciphertext. The suite is picked when a channel is
//! built; the call sites never branch on it.

use std::fmt;

use aes_gcm::{
    Aes256Gcm,
    aead::{Aead as _, KeyInit as _},
};
use chacha20poly1305::{
    ChaCha20Poly1305,
    aead::{Aead as _, KeyInit as _},
};
use rand::{CryptoRng, RngCore};
use zeroize::Zeroize;

use crate::error::CryptoError;

/// AEAD nonce size in bytes (96 bits, both suites)
pub const AEAD_NONCE_SIZE: usize = 12;

/// AEAD authentication tag size in bytes (128 bits, both suites)
pub const AEAD_TAG_SIZE: usize = 16;

/// Symmetric key size in bytes (256 bits, both suites)
pub const SYMMETRIC_KEY_SIZE: usize = 32;

/// AEAD suite selected at channel construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymmetricSuite {
    /// AES-256 in Galois/Counter Mode
    Aes256Gcm,
    /// ChaCha20 stream cipher with Poly1305 MAC (RFC 8439)
    ChaCha20Poly1305,
}

impl SymmetricSuite {
    /// Human-readable suite name, stable for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
        }
    }
}

impl fmt::Display for SymmetricSuite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shared secret for one AEAD channel.
///
/// Read-only once built, so concurrent seals and opens may share it through
/// clones without locking. Zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; SYMMETRIC_KEY_SIZE]);

impl SymmetricKey {
    /// Build a key from existing material.
    ///
    /// # Errors
    ///
    /// - `InvalidKeyLength` unless `bytes` is exactly 32 bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let key: [u8; SYMMETRIC_KEY_SIZE] = bytes.try_into().map_err(|_| {
            CryptoError::InvalidKeyLength { expected: SYMMETRIC_KEY_SIZE, actual: bytes.len() }
        })?;
        Ok(Self(key))
    }

    /// Generate a fresh key from a CSPRNG.
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R) -> Self {
        let mut key = [0u8; SYMMETRIC_KEY_SIZE];
        rng.fill_bytes(&mut key);
        Self(key)
    }

    fn as_bytes(&self) -> &[u8; SYMMETRIC_KEY_SIZE] {
        &self.0
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Output of [`seal`]: the nonce that was drawn plus ciphertext‖tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SealedBox {
    /// The 12-byte nonce drawn for this seal
    pub nonce: [u8; AEAD_NONCE_SIZE],
    /// The ciphertext including the 16-byte tag
    pub ciphertext: Vec<u8>,
}

impl SealedBox {
    /// Plaintext length (ciphertext length minus authentication tag).
    pub fn plaintext_len(&self) -> usize {
        self.ciphertext.len().saturating_sub(AEAD_TAG_SIZE)
    }
}

/// Encrypt and authenticate `plaintext` under `key`.
///
/// A fresh nonce is drawn from `rng` on every call and returned alongside
/// the ciphertext, since the opener cannot derive it.
///
/// # Errors
///
/// - `PayloadTooLarge` if the plaintext exceeds the AEAD's per-message limit
///   (about 64 GiB for both suites)
pub fn seal<R: CryptoRng + RngCore>(
    suite: SymmetricSuite,
    key: &SymmetricKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<SealedBox, CryptoError> {
    let mut nonce = [0u8; AEAD_NONCE_SIZE];
    rng.fill_bytes(&mut nonce);

    let sealed = match suite {
        SymmetricSuite::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .encrypt(aes_gcm::Nonce::from_slice(&nonce), plaintext)
            .ok(),
        SymmetricSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new(key.as_bytes().into())
            .encrypt(chacha20poly1305::Nonce::from_slice(&nonce), plaintext)
            .ok(),
    };

    let ciphertext = sealed
        .ok_or(CryptoError::PayloadTooLarge { size: plaintext.len(), max: max_plaintext_len() })?;

    debug_assert_eq!(ciphertext.len(), plaintext.len() + AEAD_TAG_SIZE);

    Ok(SealedBox { nonce, ciphertext })
}

/// Verify and decrypt `ciphertext` (ciphertext‖tag) sealed under `key`.
///
/// # Errors
///
/// - `InvalidInputLength` if `nonce` is not 12 bytes or `ciphertext` is
///   shorter than the tag
/// - `AuthenticationFailure` if the tag does not verify
pub fn open(
    suite: SymmetricSuite,
    key: &SymmetricKey,
    nonce: &[u8],
    ciphertext: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    if nonce.len() != AEAD_NONCE_SIZE {
        return Err(CryptoError::InvalidInputLength {
            field: "nonce",
            expected: AEAD_NONCE_SIZE,
            actual: nonce.len(),
        });
    }

    if ciphertext.len() < AEAD_TAG_SIZE {
        return Err(CryptoError::InvalidInputLength {
            field: "ciphertext",
            expected: AEAD_TAG_SIZE,
            actual: ciphertext.len(),
        });
    }

    let opened = match suite {
        SymmetricSuite::Aes256Gcm => Aes256Gcm::new(key.as_bytes().into())
            .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext)
            .ok(),
        SymmetricSuite::ChaCha20Poly1305 => ChaCha20Poly1305::new(key.as_bytes().into())
            .decrypt(chacha20poly1305::Nonce::from_slice(nonce), ciphertext)
            .ok(),
    };

    opened.ok_or(CryptoError::AuthenticationFailure)
}

/// Per-message plaintext ceiling shared by both suites (GCM's is the lower).
fn max_plaintext_len() -> usize {
    // 2^36 - 32 bytes for GCM; saturates on 32-bit targets
    usize::try_from((1u64 << 36) - 32).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;

    const SUITES: [SymmetricSuite; 2] =
        [SymmetricSuite::Aes256Gcm, SymmetricSuite::ChaCha20Poly1305];

    fn test_key(fill: u8) -> SymmetricKey {
        SymmetricKey::from_bytes(&[fill; SYMMETRIC_KEY_SIZE]).unwrap()
    }

    #[test]
    fn seal_open_roundtrip() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        for suite in SUITES {
            let key = test_key(0x11);
            let sealed = seal(suite, &key, b"Hello, World!", &mut rng).unwrap();
            let opened = open(suite, &key, &sealed.nonce, &sealed.ciphertext).unwrap();
            assert_eq!(opened, b"Hello, World!", "{suite}");
        }
    }

    #[test]
    fn seal_open_empty_message() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        for suite in SUITES {
            let key = test_key(0x22);
            let sealed = seal(suite, &key, b"", &mut rng).unwrap();
            assert_eq!(sealed.ciphertext.len(), AEAD_TAG_SIZE);
            assert_eq!(open(suite, &key, &sealed.nonce, &sealed.ciphertext).unwrap(), b"");
        }
    }

    #[test]
    fn ciphertext_is_plaintext_plus_tag() {
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let sealed =
            seal(SymmetricSuite::Aes256Gcm, &test_key(0), b"test message", &mut rng).unwrap();

        assert_eq!(sealed.ciphertext.len(), b"test message".len() + AEAD_TAG_SIZE);
        assert_eq!(sealed.plaintext_len(), b"test message".len());
    }

    #[test]
    fn consecutive_seals_draw_different_nonces() {
        let mut rng = ChaCha20Rng::seed_from_u64(4);
        let key = test_key(0x33);

        let first = seal(SymmetricSuite::ChaCha20Poly1305, &key, b"same", &mut rng).unwrap();
        let second = seal(SymmetricSuite::ChaCha20Poly1305, &key, b"same", &mut rng).unwrap();

        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn wrong_key_fails_authentication() {
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        for suite in SUITES {
            let sealed = seal(suite, &test_key(0x01), b"secret", &mut rng).unwrap();
            let result = open(suite, &test_key(0x02), &sealed.nonce, &sealed.ciphertext);
            assert_eq!(result, Err(CryptoError::AuthenticationFailure));
        }
    }

    #[test]
    fn wrong_suite_fails_authentication() {
        let mut rng = ChaCha20Rng::seed_from_u64(6);
        let key = test_key(0x44);
        let sealed = seal(SymmetricSuite::Aes256Gcm, &key, b"cross-suite", &mut rng).unwrap();

        let result = open(SymmetricSuite::ChaCha20Poly1305, &key, &sealed.nonce, &sealed.ciphertext);
        assert_eq!(result, Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn short_nonce_is_rejected_before_decryption() {
        let result = open(SymmetricSuite::Aes256Gcm, &test_key(0), &[0u8; 11], &[0u8; 32]);
        assert_eq!(
            result,
            Err(CryptoError::InvalidInputLength { field: "nonce", expected: 12, actual: 11 })
        );
    }

    #[test]
    fn ciphertext_shorter_than_tag_is_rejected() {
        let result =
            open(SymmetricSuite::ChaCha20Poly1305, &test_key(0), &[0u8; 12], &[0u8; 15]);
        assert_eq!(
            result,
            Err(CryptoError::InvalidInputLength { field: "ciphertext", expected: 16, actual: 15 })
        );
    }

    #[test]
    fn key_from_wrong_length_is_rejected() {
        let result = SymmetricKey::from_bytes(&[0u8; 16]);
        assert_eq!(result, Err(CryptoError::InvalidKeyLength { expected: 32, actual: 16 }));
    }

    #[test]
    fn key_debug_is_redacted() {
        let key = test_key(0xAB);
        let rendered = format!("{key:?}");
        assert_eq!(rendered, "SymmetricKey(<redacted>)");
        assert!(!rendered.contains("171"));
    }

    #[test]
    fn generated_keys_differ() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        assert_ne!(SymmetricKey::generate(&mut rng), SymmetricKey::generate(&mut rng));
    }
}
