//! Public-key cipher adapter using RSA-OAEP with SHA-256
//!
//! Single-shot only: there is no chunking, so the plaintext bound is checked
//! before the primitive is touched.

use std::fmt;

use rand::{CryptoRng, RngCore};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey, traits::PublicKeyParts};
use sha2::Sha256;

use crate::error::CryptoError;

/// Output size of the OAEP hash (SHA-256)
const OAEP_HASH_SIZE: usize = 32;

/// Smallest modulus accepted for key generation
pub const MIN_RSA_BITS: usize = 1024;

/// Modulus size used by the bootstrap when none is configured
pub const DEFAULT_RSA_BITS: usize = 2048;

/// Sealing half of an OAEP key pair.
#[derive(Clone, PartialEq, Eq)]
pub struct OaepPublicKey(RsaPublicKey);

impl OaepPublicKey {
    /// Modulus size in bytes; every ciphertext has exactly this length.
    pub fn modulus_len(&self) -> usize {
        self.0.size()
    }

    /// Largest plaintext [`seal`] accepts for this key.
    ///
    /// `k - 2 * hLen - 2` per RFC 8017 §7.1.1.
    pub fn max_plaintext_len(&self) -> usize {
        self.modulus_len().saturating_sub(2 * OAEP_HASH_SIZE + 2)
    }
}

impl From<RsaPublicKey> for OaepPublicKey {
    fn from(key: RsaPublicKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for OaepPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OaepPublicKey").field("bits", &(self.modulus_len() * 8)).finish()
    }
}

/// Opening half of an OAEP key pair.
///
/// The underlying key zeroizes its secret components on drop.
#[derive(Clone)]
pub struct OaepPrivateKey(RsaPrivateKey);

impl OaepPrivateKey {
    /// Generate a key pair with a `bits`-bit modulus.
    ///
    /// # Errors
    ///
    /// - `KeyGeneration` if `bits` is below [`MIN_RSA_BITS`] or the primitive
    ///   rejects the request
    pub fn generate<R: CryptoRng + RngCore>(rng: &mut R, bits: usize) -> Result<Self, CryptoError> {
        if bits < MIN_RSA_BITS {
            return Err(CryptoError::KeyGeneration {
                reason: format!("modulus of {bits} bits is below the {MIN_RSA_BITS}-bit minimum"),
            });
        }

        RsaPrivateKey::new(rng, bits)
            .map(Self)
            .map_err(|e| CryptoError::KeyGeneration { reason: e.to_string() })
    }

    /// Derive the matching public key.
    pub fn public_key(&self) -> OaepPublicKey {
        OaepPublicKey(self.0.to_public_key())
    }

    /// Modulus size in bytes.
    pub fn modulus_len(&self) -> usize {
        self.0.size()
    }
}

impl From<RsaPrivateKey> for OaepPrivateKey {
    fn from(key: RsaPrivateKey) -> Self {
        Self(key)
    }
}

impl fmt::Debug for OaepPrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OaepPrivateKey")
            .field("bits", &(self.modulus_len() * 8))
            .finish_non_exhaustive()
    }
}

/// Encrypt `plaintext` to `public` with OAEP padding.
///
/// # Errors
///
/// - `PayloadTooLarge` if `plaintext` exceeds
///   [`OaepPublicKey::max_plaintext_len`]; `rng` is not touched in that case
/// - `Primitive` if the RSA primitive fails on an in-bound plaintext
pub fn seal<R: CryptoRng + RngCore>(
    public: &OaepPublicKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, CryptoError> {
    let max = public.max_plaintext_len();
    if plaintext.len() > max {
        return Err(CryptoError::PayloadTooLarge { size: plaintext.len(), max });
    }

    let ciphertext = public
        .0
        .encrypt(rng, Oaep::new::<Sha256>(), plaintext)
        .map_err(|err| encryption_failure(err, plaintext.len(), max))?;

    debug_assert_eq!(ciphertext.len(), public.modulus_len());

    Ok(ciphertext)
}

fn encryption_failure(err: rsa::Error, size: usize, max: usize) -> CryptoError {
    match err {
        rsa::Error::MessageTooLong => CryptoError::PayloadTooLarge { size, max },
        other => CryptoError::Primitive { reason: other.to_string() },
    }
}

/// Decrypt an OAEP ciphertext with `private`.
///
/// # Errors
///
/// - `InvalidInputLength` if `ciphertext` is not exactly the modulus size
/// - `AuthenticationFailure` if the padding check fails
pub fn open(private: &OaepPrivateKey, ciphertext: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let expected = private.modulus_len();
    if ciphertext.len() != expected {
        return Err(CryptoError::InvalidInputLength {
            field: "ciphertext",
            expected,
            actual: ciphertext.len(),
        });
    }

    private
        .0
        .decrypt(Oaep::new::<Sha256>(), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailure)
}
