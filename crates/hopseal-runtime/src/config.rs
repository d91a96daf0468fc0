//! Run configuration.

use hopseal_crypto::{DEFAULT_RSA_BITS, FINGERPRINT_SIZE, MIN_RSA_BITS};
use thiserror::Error;

use crate::bootstrap::SuiteKind;

/// Default payload size for a relay run (1 MiB)
pub const DEFAULT_PAYLOAD_SIZE: usize = 1024 * 1024;

/// Largest payload a relay run will generate (256 MiB)
pub const MAX_PAYLOAD_SIZE: usize = 256 * 1024 * 1024;

/// Default number of messages in an exchange run
pub const DEFAULT_MESSAGE_COUNT: usize = 10;

/// Configuration errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// RSA modulus below the supported minimum
    #[error("RSA modulus of {bits} bits is below the {min}-bit minimum")]
    RsaBitsTooSmall {
        /// Requested size
        bits: usize,
        /// Minimum accepted size
        min: usize,
    },

    /// Payload size above [`MAX_PAYLOAD_SIZE`]
    #[error("payload of {size} bytes exceeds the {max}-byte limit")]
    PayloadTooLarge {
        /// Requested size
        size: usize,
        /// Maximum accepted size
        max: usize,
    },

    /// An exchange must carry at least one message
    #[error("exchange needs at least one message")]
    NoMessages,

    /// Fault on the payload link of a run with an empty payload, which has
    /// no bits to corrupt
    #[error("payload link fault has no effect on an empty payload")]
    EmptyPayloadFault,
}

/// Configuration for one three-party relay run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    /// Random payload bytes the Sender produces
    pub payload_size: usize,
    /// Suite on hop A (Sender to Relay)
    pub hop_a: SuiteKind,
    /// Suite on hop B (Relay to Receiver)
    pub hop_b: SuiteKind,
    /// RSA modulus size for any public-key hop
    pub rsa_bits: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            payload_size: DEFAULT_PAYLOAD_SIZE,
            hop_a: SuiteKind::ChaCha20Poly1305,
            hop_b: SuiteKind::Aes256Gcm,
            rsa_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl RelayConfig {
    /// Check the configuration before any key is generated.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if `payload_size` exceeds [`MAX_PAYLOAD_SIZE`]
    /// - `RsaBitsTooSmall` if either hop uses RSA-OAEP with a modulus too
    ///   small to carry a fingerprint
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.payload_size > MAX_PAYLOAD_SIZE {
            return Err(ConfigError::PayloadTooLarge {
                size: self.payload_size,
                max: MAX_PAYLOAD_SIZE,
            });
        }

        if self.hop_a == SuiteKind::RsaOaep || self.hop_b == SuiteKind::RsaOaep {
            validate_rsa_bits(self.rsa_bits)?;
        }

        Ok(())
    }
}

/// Configuration for one two-party exchange run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeConfig {
    /// Suite on the direct link
    pub suite: SuiteKind,
    /// Number of messages to send
    pub messages: usize,
    /// RSA modulus size when `suite` is RSA-OAEP
    pub rsa_bits: usize,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            suite: SuiteKind::Aes256Gcm,
            messages: DEFAULT_MESSAGE_COUNT,
            rsa_bits: DEFAULT_RSA_BITS,
        }
    }
}

impl ExchangeConfig {
    /// Check the configuration before any key is generated.
    ///
    /// # Errors
    ///
    /// - `NoMessages` if `messages` is zero
    /// - `RsaBitsTooSmall` for RSA-OAEP with an undersized modulus
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.messages == 0 {
            return Err(ConfigError::NoMessages);
        }
        if self.suite == SuiteKind::RsaOaep {
            validate_rsa_bits(self.rsa_bits)?;
        }
        Ok(())
    }
}

fn validate_rsa_bits(bits: usize) -> Result<(), ConfigError> {
    // MIN_RSA_BITS leaves room for a fingerprint under OAEP-SHA256
    debug_assert!(MIN_RSA_BITS / 8 - 66 >= FINGERPRINT_SIZE);

    if bits < MIN_RSA_BITS {
        return Err(ConfigError::RsaBitsTooSmall { bits, min: MIN_RSA_BITS });
    }
    Ok(())
}
