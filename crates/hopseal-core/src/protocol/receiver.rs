//! Receiver state machine.
//!
//! Collects the plain payload from the Sender and the resealed fingerprint
//! from the Relay in either order, then verifies. Verification only starts
//! once both inputs are held.

use bytes::Bytes;
use hopseal_crypto::{CryptoError, Fingerprint};
use hopseal_proto::{Party, WireError, WireMessage};
use tracing::{debug, info, warn};

use super::Outcome;
use crate::{channel::SecureChannel, error::ProtocolError};

/// Receiver state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiverState {
    /// Waiting for the payload, the relayed fingerprint, or both
    Waiting,
    /// Both inputs held, comparing fingerprints
    Verify,
    /// Verdict reached: `Valid` or `Invalid`
    Done,
    /// No verdict possible
    Aborted,
}

impl ReceiverState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Waiting => "waiting",
            Self::Verify => "verify",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

/// Receiver actor.
#[derive(Debug)]
pub struct ReceiverActor {
    state: ReceiverState,
    hop_b: SecureChannel,
    payload: Option<Bytes>,
    sealed_fingerprint: Option<Bytes>,
    outcome: Option<Outcome>,
}

impl ReceiverActor {
    /// Create a Receiver that opens relayed fingerprints with `hop_b`.
    pub fn new(hop_b: SecureChannel) -> Self {
        Self {
            state: ReceiverState::Waiting,
            hop_b,
            payload: None,
            sealed_fingerprint: None,
            outcome: None,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> ReceiverState {
        self.state
    }

    /// Returns true once the plain payload has arrived.
    #[must_use]
    pub fn has_payload(&self) -> bool {
        self.payload.is_some()
    }

    /// Returns true once the relayed fingerprint has arrived.
    #[must_use]
    pub fn has_sealed_fingerprint(&self) -> bool {
        self.sealed_fingerprint.is_some()
    }

    /// Verdict, once reached.
    #[must_use]
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Verified payload. `None` unless the outcome is [`Outcome::Valid`].
    #[must_use]
    pub fn into_payload(self) -> Option<Bytes> {
        match self.outcome {
            Some(Outcome::Valid) => self.payload,
            _ => None,
        }
    }

    /// Handle one message.
    ///
    /// Returns the outcome exactly once, on the message that completes the
    /// run. Messages arriving after that are dropped with a warning.
    pub fn handle_message(&mut self, from: Party, message: Bytes) -> Option<Outcome> {
        if self.state != ReceiverState::Waiting {
            warn!(%from, state = self.state.as_str(), "receiver dropping late message");
            return None;
        }

        let slot = match from {
            Party::Sender => &mut self.payload,
            Party::Relay => &mut self.sealed_fingerprint,
            Party::Receiver => return Some(self.abort(from)),
        };
        if slot.is_some() {
            return Some(self.abort(from));
        }

        debug!(%from, size = message.len(), "receiver input");
        *slot = Some(message);

        let (Some(payload), Some(sealed)) =
            (self.payload.clone(), self.sealed_fingerprint.clone())
        else {
            return None;
        };

        self.transition(ReceiverState::Verify);
        let outcome = match verify(&self.hop_b, &payload, &sealed) {
            Ok(outcome) => {
                self.transition(ReceiverState::Done);
                outcome
            },
            Err(reason) => {
                warn!(error = %reason, "receiver aborted");
                self.state = ReceiverState::Aborted;
                Outcome::Aborted { reason }
            },
        };

        info!(%outcome, "receiver finished");
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    fn abort(&mut self, from: Party) -> Outcome {
        let reason = ProtocolError::UnexpectedMessage { from, state: self.state.as_str() };
        warn!(error = %reason, "receiver aborted");

        self.state = ReceiverState::Aborted;
        let outcome = Outcome::Aborted { reason };
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn transition(&mut self, next: ReceiverState) {
        info!(from = self.state.as_str(), to = next.as_str(), "receiver transition");
        self.state = next;
    }
}

/// Compare the payload's fingerprint with the one relayed on hop B.
///
/// Opening happens first: if the relayed fingerprint does not open, no
/// comparison is attempted. A hop B message that does not even decode failed
/// to open as much as one whose tag is wrong.
fn verify(hop_b: &SecureChannel, payload: &[u8], sealed: &[u8]) -> Result<Outcome, ProtocolError> {
    let relayed = WireMessage::decode(sealed)
        .map_err(|err| framing_failure(&err, sealed.len()))
        .and_then(|message| hop_b.open(&message))
        .and_then(|plaintext| Fingerprint::from_slice(&plaintext))
        .map_err(|source| ProtocolError::IntegrityIndeterminate { source })?;

    let computed = Fingerprint::of(payload);
    debug!(%computed, %relayed, "comparing fingerprints");

    Ok(if computed == relayed { Outcome::Valid } else { Outcome::Invalid })
}

fn framing_failure(err: &WireError, len: usize) -> CryptoError {
    let (expected, actual) = match *err {
        WireError::Truncated { expected, actual } => (expected, actual),
        WireError::TooLarge { size, max } => (max, size),
        WireError::NonceTooLong { .. } | WireError::UnknownParty(_) => (0, len),
    };
    CryptoError::InvalidInputLength { field: "message", expected, actual }
}

#[cfg(test)]
mod tests {
    use hopseal_crypto::{SymmetricKey, SymmetricSuite};

    use super::*;
    use crate::env::test_env::SeededEnv;

    fn hop_b() -> SecureChannel {
        SecureChannel::aead(SymmetricSuite::Aes256Gcm, SymmetricKey::from_bytes(&[0xB; 32]).unwrap())
    }

    fn relayed(env: &SeededEnv, payload: &[u8]) -> Bytes {
        hop_b().seal(Fingerprint::of(payload).as_bytes(), env).unwrap().to_bytes().unwrap()
    }

    #[test]
    fn payload_first_then_fingerprint_is_valid() {
        let env = SeededEnv::new(1);
        let mut receiver = ReceiverActor::new(hop_b());

        assert_eq!(receiver.handle_message(Party::Sender, Bytes::from_static(b"data")), None);
        assert!(receiver.has_payload());
        assert_eq!(receiver.state(), ReceiverState::Waiting);

        let outcome = receiver.handle_message(Party::Relay, relayed(&env, b"data"));
        assert_eq!(outcome, Some(Outcome::Valid));
        assert_eq!(receiver.state(), ReceiverState::Done);
        assert_eq!(receiver.into_payload().as_deref(), Some(&b"data"[..]));
    }

    #[test]
    fn fingerprint_first_then_payload_is_valid() {
        let env = SeededEnv::new(2);
        let mut receiver = ReceiverActor::new(hop_b());

        assert_eq!(receiver.handle_message(Party::Relay, relayed(&env, b"data")), None);
        assert!(receiver.has_sealed_fingerprint());

        let outcome = receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));
        assert_eq!(outcome, Some(Outcome::Valid));
    }

    #[test]
    fn altered_payload_is_invalid_not_an_error() {
        let env = SeededEnv::new(3);
        let mut receiver = ReceiverActor::new(hop_b());

        receiver.handle_message(Party::Relay, relayed(&env, b"data"));
        let outcome = receiver.handle_message(Party::Sender, Bytes::from_static(b"dbta"));

        assert_eq!(outcome, Some(Outcome::Invalid));
        assert_eq!(receiver.state(), ReceiverState::Done);
        assert_eq!(receiver.into_payload(), None);
    }

    #[test]
    fn tampered_fingerprint_is_indeterminate() {
        let env = SeededEnv::new(4);
        let mut receiver = ReceiverActor::new(hop_b());
        let mut sealed = relayed(&env, b"data").to_vec();
        let last = sealed.len() - 1;
        sealed[last] ^= 0x80;

        receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));
        let outcome = receiver.handle_message(Party::Relay, Bytes::from(sealed));

        assert_eq!(
            outcome,
            Some(Outcome::Aborted {
                reason: ProtocolError::IntegrityIndeterminate {
                    source: CryptoError::AuthenticationFailure
                }
            })
        );
        assert_eq!(receiver.state(), ReceiverState::Aborted);
    }

    #[test]
    fn corrupted_nonce_length_is_indeterminate() {
        let env = SeededEnv::new(8);
        let sealed = relayed(&env, b"data");

        for bit in 0..8 {
            let mut corrupted = sealed.to_vec();
            corrupted[0] ^= 1 << bit;
            let mut receiver = ReceiverActor::new(hop_b());
            receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));

            let outcome = receiver.handle_message(Party::Relay, Bytes::from(corrupted)).unwrap();

            let is_indeterminate = matches!(
                outcome.abort_reason(),
                Some(ProtocolError::IntegrityIndeterminate {
                    source: CryptoError::InvalidInputLength { .. }
                })
            );
            assert!(is_indeterminate, "bit {bit}: {outcome}");
        }
    }

    #[test]
    fn empty_relayed_message_is_indeterminate() {
        let mut receiver = ReceiverActor::new(hop_b());
        receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));

        let outcome = receiver.handle_message(Party::Relay, Bytes::new());

        assert_eq!(
            outcome,
            Some(Outcome::Aborted {
                reason: ProtocolError::IntegrityIndeterminate {
                    source: CryptoError::InvalidInputLength {
                        field: "message",
                        expected: 1,
                        actual: 0
                    }
                }
            })
        );
    }

    #[test]
    fn relayed_plaintext_of_wrong_size_is_indeterminate() {
        let env = SeededEnv::new(5);
        let mut receiver = ReceiverActor::new(hop_b());
        let sealed = hop_b().seal(b"short", &env).unwrap().to_bytes().unwrap();

        receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));
        let outcome = receiver.handle_message(Party::Relay, sealed).unwrap();

        let is_indeterminate = matches!(
            outcome.abort_reason(),
            Some(ProtocolError::IntegrityIndeterminate {
                source: CryptoError::InvalidInputLength { field: "fingerprint", .. }
            })
        );
        assert!(is_indeterminate);
    }

    #[test]
    fn duplicate_payload_aborts() {
        let mut receiver = ReceiverActor::new(hop_b());
        receiver.handle_message(Party::Sender, Bytes::from_static(b"one"));

        let outcome = receiver.handle_message(Party::Sender, Bytes::from_static(b"two"));
        assert_eq!(
            outcome,
            Some(Outcome::Aborted {
                reason: ProtocolError::UnexpectedMessage { from: Party::Sender, state: "waiting" }
            })
        );
    }

    #[test]
    fn messages_after_verdict_are_dropped() {
        let env = SeededEnv::new(6);
        let mut receiver = ReceiverActor::new(hop_b());
        receiver.handle_message(Party::Sender, Bytes::from_static(b"data"));
        receiver.handle_message(Party::Relay, relayed(&env, b"data"));

        assert_eq!(receiver.handle_message(Party::Sender, Bytes::from_static(b"more")), None);
        assert_eq!(receiver.outcome(), Some(&Outcome::Valid));
    }

    #[test]
    fn empty_payload_verifies() {
        let env = SeededEnv::new(7);
        let mut receiver = ReceiverActor::new(hop_b());
        receiver.handle_message(Party::Sender, Bytes::new());

        let outcome = receiver.handle_message(Party::Relay, relayed(&env, b""));
        assert_eq!(outcome, Some(Outcome::Valid));
    }
}
