//! Key bootstrap: turns a suite choice into the two ends of one hop.
//!
//! Keys are generated here once and handed to the actors as channels. The
//! protocol core never sees how they were made.

use std::{fmt, str::FromStr};

use hopseal_core::SecureChannel;
use hopseal_crypto::{CryptoError, OaepPrivateKey, SymmetricKey, SymmetricSuite};
use rand::{CryptoRng, RngCore};
use tracing::debug;

/// Cipher suite selectable for a hop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SuiteKind {
    /// AES-256-GCM with a shared key
    Aes256Gcm,
    /// ChaCha20-Poly1305 with a shared key
    ChaCha20Poly1305,
    /// RSA-OAEP: the opening end holds the private key
    RsaOaep,
}

impl SuiteKind {
    /// Every selectable suite.
    pub const ALL: [Self; 3] = [Self::Aes256Gcm, Self::ChaCha20Poly1305, Self::RsaOaep];

    /// Name accepted on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Self::Aes256Gcm => "aes-256-gcm",
            Self::ChaCha20Poly1305 => "chacha20-poly1305",
            Self::RsaOaep => "rsa-oaep",
        }
    }
}

impl fmt::Display for SuiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Unrecognized suite name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown suite `{0}` (expected aes-256-gcm, chacha20-poly1305 or rsa-oaep)")]
pub struct UnknownSuite(pub String);

impl FromStr for SuiteKind {
    type Err = UnknownSuite;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownSuite(s.to_string()))
    }
}

/// Sealing and opening ends of one hop.
#[derive(Debug, Clone)]
pub struct HopKeys {
    /// End held by the party that seals
    pub sealer: SecureChannel,
    /// End held by the party that opens
    pub opener: SecureChannel,
}

impl HopKeys {
    /// Generate fresh key material for `kind`.
    ///
    /// `rsa_bits` is only used for [`SuiteKind::RsaOaep`].
    ///
    /// # Errors
    ///
    /// - `KeyGeneration` if RSA key generation fails or `rsa_bits` is too
    ///   small
    pub fn generate<R: CryptoRng + RngCore>(
        kind: SuiteKind,
        rsa_bits: usize,
        rng: &mut R,
    ) -> Result<Self, CryptoError> {
        let keys = match kind {
            SuiteKind::Aes256Gcm => Self::symmetric(SymmetricSuite::Aes256Gcm, rng),
            SuiteKind::ChaCha20Poly1305 => Self::symmetric(SymmetricSuite::ChaCha20Poly1305, rng),
            SuiteKind::RsaOaep => {
                let private = OaepPrivateKey::generate(rng, rsa_bits)?;
                Self {
                    sealer: SecureChannel::oaep_sealer(private.public_key()),
                    opener: SecureChannel::oaep_opener(private),
                }
            },
        };

        debug!(suite = %kind, "hop keys generated");
        Ok(keys)
    }

    fn symmetric<R: CryptoRng + RngCore>(suite: SymmetricSuite, rng: &mut R) -> Self {
        let key = SymmetricKey::generate(rng);
        Self {
            sealer: SecureChannel::aead(suite, key.clone()),
            opener: SecureChannel::aead(suite, key),
        }
    }
}

/// Channels for all three relay actors.
#[derive(Debug, Clone)]
pub struct RelayKeys {
    /// Sender's end of hop A
    pub sender_hop_a: SecureChannel,
    /// Relay's end of hop A
    pub relay_hop_a: SecureChannel,
    /// Relay's end of hop B
    pub relay_hop_b: SecureChannel,
    /// Receiver's end of hop B
    pub receiver_hop_b: SecureChannel,
}

impl RelayKeys {
    /// Assign hop ends: the Sender seals A, the Relay opens A and seals B,
    /// the Receiver opens B.
    pub fn from_hops(hop_a: HopKeys, hop_b: HopKeys) -> Self {
        Self {
            sender_hop_a: hop_a.sealer,
            relay_hop_a: hop_a.opener,
            relay_hop_b: hop_b.sealer,
            receiver_hop_b: hop_b.opener,
        }
    }
}

#[cfg(test)]
mod tests {
    use hopseal_core::env::Environment;
    use hopseal_crypto::MIN_RSA_BITS;
    use rand::SeedableRng;
    use rand_chacha::ChaCha20Rng;

    use super::*;
    use crate::SystemEnv;

    #[test]
    fn suite_names_parse_back() {
        for kind in SuiteKind::ALL {
            assert_eq!(kind.name().parse::<SuiteKind>(), Ok(kind));
        }
        assert_eq!("AES-256-GCM".parse::<SuiteKind>(), Ok(SuiteKind::Aes256Gcm));
        assert!("des".parse::<SuiteKind>().is_err());
    }

    #[test]
    fn generated_hops_interoperate() {
        let mut rng = ChaCha20Rng::seed_from_u64(1);
        let env = SystemEnv::new();

        for kind in SuiteKind::ALL {
            let keys = HopKeys::generate(kind, MIN_RSA_BITS, &mut rng).unwrap();
            let sealed = keys.sealer.seal(b"fingerprint", &env).unwrap();
            assert_eq!(keys.opener.open(&sealed).unwrap(), b"fingerprint", "{kind}");
        }
    }

    #[test]
    fn independently_generated_hops_do_not_interoperate() {
        let env = SystemEnv::new();
        let mut rng = env.rng();
        let first = HopKeys::generate(SuiteKind::Aes256Gcm, MIN_RSA_BITS, &mut rng).unwrap();
        let second = HopKeys::generate(SuiteKind::Aes256Gcm, MIN_RSA_BITS, &mut rng).unwrap();

        let sealed = first.sealer.seal(b"fingerprint", &env).unwrap();
        assert_eq!(second.opener.open(&sealed), Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn undersized_rsa_modulus_is_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(2);
        let result = HopKeys::generate(SuiteKind::RsaOaep, 512, &mut rng);
        assert!(matches!(result, Err(CryptoError::KeyGeneration { .. })));
    }
}
