//! Hopseal Cryptographic Primitives
//!
//! Cipher adapters and the digest function behind hopseal's secure channels.
//! Every adapter takes its randomness from a caller-provided CSPRNG so
//! production can use the OS generator while simulations stay reproducible.
//!
//! # Suites
//!
//! ```text
//! ┌──────────────────────┬──────────────┬──────────┬──────────────────────┐
//! │ Suite                │ Nonce        │ Tag      │ Payload bound        │
//! ├──────────────────────┼──────────────┼──────────┼──────────────────────┤
//! │ AES-256-GCM          │ 96-bit rand  │ 128-bit  │ effectively none     │
//! │ ChaCha20-Poly1305    │ 96-bit rand  │ 128-bit  │ effectively none     │
//! │ RSA-OAEP (SHA-256)   │ none         │ padding  │ modulus - 66 bytes   │
//! └──────────────────────┴──────────────┴──────────┴──────────────────────┘
//! ```
//!
//! # Security
//!
//! Nonce Uniqueness:
//! - AEAD nonces are drawn inside [`symmetric::seal`] on every call
//! - There is no sealing API that accepts a nonce from the caller
//! - 96 random bits keep the collision probability negligible for the message
//!   counts a single channel sees
//!
//! Authenticity:
//! - Any tag or padding mismatch surfaces as
//!   [`CryptoError::AuthenticationFailure`]
//! - Failures are deterministic, so nothing in this crate retries
//!
//! Key Hygiene:
//! - Symmetric keys are zeroized on drop
//! - No key type prints its bytes through `Debug`

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod asymmetric;
pub mod digest;
pub mod error;
pub mod symmetric;

pub use asymmetric::{DEFAULT_RSA_BITS, MIN_RSA_BITS, OaepPrivateKey, OaepPublicKey};
pub use digest::{FINGERPRINT_SIZE, Fingerprint};
pub use error::CryptoError;
pub use symmetric::{
    AEAD_NONCE_SIZE, AEAD_TAG_SIZE, SYMMETRIC_KEY_SIZE, SealedBox, SymmetricKey, SymmetricSuite,
};
