//! Environment abstraction for deterministic testing.
//!
//! Decouples protocol logic from the source of randomness. Production uses
//! the OS CSPRNG; simulation uses a seeded generator so runs are
//! reproducible.

use rand::{CryptoRng, RngCore};

/// Abstract environment providing randomness.
///
/// # Safety
///
/// Implementations MUST guarantee:
///
/// - `random_bytes()` uses cryptographically secure entropy in production.
///   AEAD nonces are drawn from it, so a weak source breaks nonce uniqueness.
/// - Methods are infallible except in exceptional circumstances (e.g., OS
///   entropy exhaustion)
pub trait Environment: Clone + Send + Sync + 'static {
    /// Fills the provided buffer with random bytes.
    ///
    /// # Invariants
    ///
    /// - Given the same RNG seed, this produces the same sequence of bytes
    /// - Uses cryptographically secure RNG
    fn random_bytes(&self, buffer: &mut [u8]);

    /// Generates a random `u64`.
    fn random_u64(&self) -> u64 {
        let mut bytes = [0u8; 8];
        self.random_bytes(&mut bytes);
        u64::from_be_bytes(bytes)
    }

    /// Borrow this environment as an `RngCore` for the cipher adapters.
    fn rng(&self) -> EnvRng<'_, Self> {
        EnvRng(self)
    }
}

/// Adapter exposing an [`Environment`] through the `rand` traits.
///
/// Marked `CryptoRng` on the strength of the [`Environment`] contract.
pub struct EnvRng<'a, E: Environment>(&'a E);

impl<E: Environment> RngCore for EnvRng<'_, E> {
    fn next_u32(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.0.random_bytes(&mut bytes);
        u32::from_be_bytes(bytes)
    }

    fn next_u64(&mut self) -> u64 {
        self.0.random_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.random_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.0.random_bytes(dest);
        Ok(())
    }
}

impl<E: Environment> CryptoRng for EnvRng<'_, E> {}
