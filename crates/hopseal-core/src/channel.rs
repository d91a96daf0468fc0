//! Secure channel: one key and one cipher suite bound to a link.
//!
//! The channel never interprets plaintext. The same abstraction carries a
//! fingerprint across a relay hop or a chat message across a direct link.
//!
//! # Framing
//!
//! ```text
//! AEAD suites:       WireMessage { nonce: 12 random bytes, payload: ct‖tag }
//! Public-key suite:  WireMessage { nonce: none,            payload: OAEP block }
//! ```

use std::fmt;

use bytes::Bytes;
use hopseal_crypto::{
    AEAD_NONCE_SIZE, CryptoError, OaepPrivateKey, OaepPublicKey, SymmetricKey, SymmetricSuite,
    asymmetric, symmetric,
};
use hopseal_proto::WireMessage;

use crate::env::Environment;

/// Suite plus key material, one variant per cipher family.
#[derive(Clone)]
enum Binding {
    Aead { suite: SymmetricSuite, key: SymmetricKey },
    Oaep { public: OaepPublicKey, private: Option<OaepPrivateKey> },
}

/// A logical point-to-point link secured by exactly one key and one suite.
///
/// Stateless per call: every [`seal`](Self::seal) draws a fresh nonce, so
/// clones of a channel may seal concurrently without coordinating.
///
/// # Invariants
///
/// - The bound key never changes after construction
/// - No caller-supplied nonce ever reaches an AEAD primitive
#[derive(Clone)]
pub struct SecureChannel {
    binding: Binding,
}

impl SecureChannel {
    /// AEAD channel; both ends hold the same key.
    pub fn aead(suite: SymmetricSuite, key: SymmetricKey) -> Self {
        Self { binding: Binding::Aead { suite, key } }
    }

    /// Public-key channel end that can only seal.
    pub fn oaep_sealer(public: OaepPublicKey) -> Self {
        Self { binding: Binding::Oaep { public, private: None } }
    }

    /// Public-key channel end that holds the private key and can open.
    pub fn oaep_opener(private: OaepPrivateKey) -> Self {
        Self { binding: Binding::Oaep { public: private.public_key(), private: Some(private) } }
    }

    /// Suite name for logs.
    pub fn suite_name(&self) -> &'static str {
        match &self.binding {
            Binding::Aead { suite, .. } => suite.name(),
            Binding::Oaep { .. } => "RSA-OAEP-SHA256",
        }
    }

    /// Largest plaintext one seal can carry, if the suite imposes a bound.
    pub fn max_plaintext_len(&self) -> Option<usize> {
        match &self.binding {
            Binding::Aead { .. } => None,
            Binding::Oaep { public, .. } => Some(public.max_plaintext_len()),
        }
    }

    /// Seal `plaintext` into a wire message.
    ///
    /// # Errors
    ///
    /// - `PayloadTooLarge` if the suite cannot carry `plaintext` in one shot
    pub fn seal<E: Environment>(
        &self,
        plaintext: &[u8],
        env: &E,
    ) -> Result<WireMessage, CryptoError> {
        let mut rng = env.rng();

        match &self.binding {
            Binding::Aead { suite, key } => {
                let sealed = symmetric::seal(*suite, key, plaintext, &mut rng)?;
                Ok(WireMessage::aead(Bytes::copy_from_slice(&sealed.nonce), sealed.ciphertext))
            },
            Binding::Oaep { public, .. } => {
                let ciphertext = asymmetric::seal(public, plaintext, &mut rng)?;
                Ok(WireMessage::sealed(ciphertext))
            },
        }
    }

    /// Open a wire message sealed by the peer end of this channel.
    ///
    /// # Errors
    ///
    /// - `InvalidInputLength` if the nonce is missing on an AEAD channel,
    ///   present on a public-key channel, or has the wrong size
    /// - `MissingPrivateKey` if this end was built with
    ///   [`oaep_sealer`](Self::oaep_sealer)
    /// - `AuthenticationFailure` if the tag or padding does not verify
    pub fn open(&self, message: &WireMessage) -> Result<Vec<u8>, CryptoError> {
        match &self.binding {
            Binding::Aead { suite, key } => {
                let nonce = message.nonce().ok_or(CryptoError::InvalidInputLength {
                    field: "nonce",
                    expected: AEAD_NONCE_SIZE,
                    actual: 0,
                })?;
                symmetric::open(*suite, key, nonce, message.payload())
            },
            Binding::Oaep { private, .. } => {
                if let Some(nonce) = message.nonce() {
                    return Err(CryptoError::InvalidInputLength {
                        field: "nonce",
                        expected: 0,
                        actual: nonce.len(),
                    });
                }
                let private = private.as_ref().ok_or(CryptoError::MissingPrivateKey)?;
                asymmetric::open(private, message.payload())
            },
        }
    }
}

impl fmt::Debug for SecureChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecureChannel").field("suite", &self.suite_name()).finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::OnceLock;

    use hopseal_crypto::MIN_RSA_BITS;

    use super::*;
    use crate::env::test_env::SeededEnv;

    fn aes_channel() -> SecureChannel {
        SecureChannel::aead(SymmetricSuite::Aes256Gcm, SymmetricKey::from_bytes(&[1; 32]).unwrap())
    }

    fn chacha_channel() -> SecureChannel {
        SecureChannel::aead(
            SymmetricSuite::ChaCha20Poly1305,
            SymmetricKey::from_bytes(&[2; 32]).unwrap(),
        )
    }

    fn rsa_private() -> OaepPrivateKey {
        static KEY: OnceLock<OaepPrivateKey> = OnceLock::new();
        KEY.get_or_init(|| {
            let env = SeededEnv::new(0xBEEF);
            OaepPrivateKey::generate(&mut env.rng(), MIN_RSA_BITS).unwrap()
        })
        .clone()
    }

    #[test]
    fn aead_channels_roundtrip() {
        let env = SeededEnv::new(1);
        for channel in [aes_channel(), chacha_channel()] {
            let message = channel.seal(b"fingerprint bytes", &env).unwrap();
            assert_eq!(message.nonce().map(<[u8]>::len), Some(AEAD_NONCE_SIZE));
            assert_eq!(channel.open(&message).unwrap(), b"fingerprint bytes");
        }
    }

    #[test]
    fn oaep_channel_roundtrip_without_nonce() {
        let env = SeededEnv::new(2);
        let opener = SecureChannel::oaep_opener(rsa_private());
        let sealer = SecureChannel::oaep_sealer(rsa_private().public_key());

        let message = sealer.seal(b"confidential", &env).unwrap();
        assert_eq!(message.nonce(), None);
        assert_eq!(opener.open(&message).unwrap(), b"confidential");
    }

    #[test]
    fn sealer_cannot_open() {
        let env = SeededEnv::new(3);
        let sealer = SecureChannel::oaep_sealer(rsa_private().public_key());
        let message = sealer.seal(b"one way", &env).unwrap();

        assert_eq!(sealer.open(&message), Err(CryptoError::MissingPrivateKey));
    }

    #[test]
    fn channels_with_different_suites_do_not_interoperate() {
        let env = SeededEnv::new(4);
        let key = SymmetricKey::from_bytes(&[7; 32]).unwrap();
        let aes = SecureChannel::aead(SymmetricSuite::Aes256Gcm, key.clone());
        let chacha = SecureChannel::aead(SymmetricSuite::ChaCha20Poly1305, key);

        let message = aes.seal(b"hop A", &env).unwrap();
        assert_eq!(chacha.open(&message), Err(CryptoError::AuthenticationFailure));
    }

    #[test]
    fn aead_channel_rejects_missing_nonce() {
        let message = WireMessage::sealed(vec![0u8; 48]);
        assert_eq!(
            aes_channel().open(&message),
            Err(CryptoError::InvalidInputLength { field: "nonce", expected: 12, actual: 0 })
        );
    }

    #[test]
    fn oaep_channel_rejects_nonce() {
        let message = WireMessage::aead(vec![0u8; 12], vec![0u8; 128]);
        let opener = SecureChannel::oaep_opener(rsa_private());
        assert_eq!(
            opener.open(&message),
            Err(CryptoError::InvalidInputLength { field: "nonce", expected: 0, actual: 12 })
        );
    }

    #[test]
    fn oaep_channel_reports_plaintext_bound() {
        let sealer = SecureChannel::oaep_sealer(rsa_private().public_key());
        assert_eq!(sealer.max_plaintext_len(), Some(62));
        assert_eq!(aes_channel().max_plaintext_len(), None);

        let env = SeededEnv::new(5);
        let result = sealer.seal(&[0u8; 63], &env);
        assert_eq!(result, Err(CryptoError::PayloadTooLarge { size: 63, max: 62 }));
    }

    #[test]
    fn debug_names_suite_only() {
        assert_eq!(format!("{:?}", aes_channel()), "SecureChannel { suite: \"AES-256-GCM\", .. }");
    }
}
