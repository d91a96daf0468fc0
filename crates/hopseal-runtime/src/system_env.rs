//! Production Environment implementation using the OS RNG.
//!
//! `SystemEnv` draws every nonce, OAEP seed and generated key from getrandom.
//! Runs are not reproducible; use a seeded environment for that.

use hopseal_core::env::Environment;

/// Production environment backed by the OS CSPRNG.
///
/// # Panics
///
/// Panics if the OS RNG fails. Sealing without functioning randomness would
/// risk nonce reuse, so there is no degraded mode.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnv;

impl SystemEnv {
    /// Create a new system environment.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Environment for SystemEnv {
    #[allow(clippy::expect_used)]
    fn random_bytes(&self, buffer: &mut [u8]) {
        getrandom::fill(buffer).expect("invariant: OS RNG failure is unrecoverable");
    }
}
