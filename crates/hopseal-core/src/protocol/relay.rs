//! Relay state machine.
//!
//! The Relay never sees the payload. It opens the fingerprint on hop A and
//! reseals it on hop B; bytes are never forwarded untransformed. The
//! recovered plaintext is treated as opaque.

use bytes::Bytes;
use hopseal_proto::{Party, WireMessage};
use tracing::{debug, info, warn};

use super::Outgoing;
use crate::{
    channel::SecureChannel,
    env::Environment,
    error::{Hop, ProtocolError},
};

/// Relay state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Waiting for the sealed fingerprint from the Sender
    WaitForSealedFingerprint,
    /// Hop A opened, sealing for hop B
    Reseal,
    /// Hop B message ready for the Receiver
    Forward,
    /// Fingerprint forwarded
    Done,
    /// Hop A failed to open or hop B failed to seal; nothing was forwarded
    Aborted,
}

impl RelayState {
    fn as_str(self) -> &'static str {
        match self {
            Self::WaitForSealedFingerprint => "wait-for-sealed-fingerprint",
            Self::Reseal => "reseal",
            Self::Forward => "forward",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

/// Relay actor bridging two independently keyed hops.
#[derive(Debug)]
pub struct RelayActor {
    state: RelayState,
    hop_a: SecureChannel,
    hop_b: SecureChannel,
}

impl RelayActor {
    /// Create a Relay that opens with `hop_a` and seals with `hop_b`.
    pub fn new(hop_a: SecureChannel, hop_b: SecureChannel) -> Self {
        Self { state: RelayState::WaitForSealedFingerprint, hop_a, hop_b }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> RelayState {
        self.state
    }

    /// Returns true once the resealed fingerprint has been emitted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == RelayState::Done
    }

    /// Handle one message and, on success, return the hop B message for the
    /// Receiver.
    ///
    /// Any failure moves the Relay to `Aborted`, except a stray message after
    /// `Done`, which is rejected without disturbing the completed run.
    ///
    /// # Errors
    ///
    /// - `UnexpectedMessage` if `from` is not the Sender or the Relay is no
    ///   longer waiting
    /// - `Malformed` if the bytes are not a wire message
    /// - `Open` if hop A rejects the message (wrong key, tampering)
    /// - `Seal` or `Encode` if hop B cannot carry the fingerprint
    pub fn handle_message<E: Environment>(
        &mut self,
        from: Party,
        bytes: &[u8],
        env: &E,
    ) -> Result<Outgoing, ProtocolError> {
        if self.state != RelayState::WaitForSealedFingerprint {
            let err = ProtocolError::UnexpectedMessage { from, state: self.state.as_str() };
            warn!(error = %err, "relay ignoring message");
            return Err(err);
        }

        match self.relay(from, bytes, env) {
            Ok(message) => {
                self.transition(RelayState::Done);
                Ok(Outgoing { to: Party::Receiver, message })
            },
            Err(err) => {
                warn!(error = %err, "relay aborted, nothing forwarded");
                self.state = RelayState::Aborted;
                Err(err)
            },
        }
    }

    fn relay<E: Environment>(
        &mut self,
        from: Party,
        bytes: &[u8],
        env: &E,
    ) -> Result<Bytes, ProtocolError> {
        if from != Party::Sender {
            return Err(ProtocolError::UnexpectedMessage { from, state: self.state.as_str() });
        }

        let incoming =
            WireMessage::decode(bytes).map_err(|source| ProtocolError::Malformed { from, source })?;
        let plaintext = self
            .hop_a
            .open(&incoming)
            .map_err(|source| ProtocolError::Open { hop: Hop::SenderRelay, source })?;
        debug!(suite = self.hop_a.suite_name(), size = plaintext.len(), "hop A opened");
        self.transition(RelayState::Reseal);

        let resealed = self
            .hop_b
            .seal(&plaintext, env)
            .map_err(|source| ProtocolError::Seal { hop: Hop::RelayReceiver, source })?;
        debug!(suite = self.hop_b.suite_name(), size = resealed.encoded_len(), "hop B sealed");
        self.transition(RelayState::Forward);

        resealed.to_bytes().map_err(|source| ProtocolError::Encode { to: Party::Receiver, source })
    }

    fn transition(&mut self, next: RelayState) {
        info!(from = self.state.as_str(), to = next.as_str(), "relay transition");
        self.state = next;
    }
}
