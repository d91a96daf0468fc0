//! Sender state machine.
//!
//! Owns the payload and its fingerprint. Emits the payload in the clear to
//! the Receiver, then the fingerprint sealed on hop A to the Relay.

use bytes::Bytes;
use hopseal_crypto::Fingerprint;
use hopseal_proto::Party;
use tracing::{debug, info, warn};

use super::Outgoing;
use crate::{
    channel::SecureChannel,
    env::Environment,
    error::{Hop, ProtocolError},
};

/// Sender state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Payload and fingerprint ready, nothing sent
    Start,
    /// Payload handed to the plain link
    PayloadSent,
    /// Sealed fingerprint handed to hop A
    FingerprintSealed,
    /// Both messages sent
    Done,
    /// Sealing or framing failed; nothing more is sent
    Aborted,
}

impl SenderState {
    fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::PayloadSent => "payload-sent",
            Self::FingerprintSealed => "fingerprint-sealed",
            Self::Done => "done",
            Self::Aborted => "aborted",
        }
    }
}

/// Sender actor.
///
/// Call [`step`](Self::step) until it returns `Ok(None)`; every `Some` is a
/// message the driver must deliver before the Sender counts as finished.
#[derive(Debug)]
pub struct SenderActor {
    state: SenderState,
    hop_a: SecureChannel,
    payload: Bytes,
    fingerprint: Fingerprint,
}

impl SenderActor {
    /// Create a Sender for `payload`, computing its fingerprint up front.
    pub fn new(hop_a: SecureChannel, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let fingerprint = Fingerprint::of(&payload);
        Self { state: SenderState::Start, hop_a, payload, fingerprint }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Fingerprint of the payload as produced.
    #[must_use]
    pub fn fingerprint(&self) -> &Fingerprint {
        &self.fingerprint
    }

    /// Returns true once both messages have been emitted.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == SenderState::Done
    }

    /// Advance one transition.
    ///
    /// `Start` emits the payload to the Receiver, `PayloadSent` emits the
    /// sealed fingerprint to the Relay, `FingerprintSealed` finishes and
    /// returns `None`.
    ///
    /// # Errors
    ///
    /// - `Seal` if hop A cannot seal the fingerprint
    /// - `Encode` if the sealed message cannot be framed
    /// - `InvalidState` if called after `Done` or `Aborted`
    pub fn step<E: Environment>(&mut self, env: &E) -> Result<Option<Outgoing>, ProtocolError> {
        match self.state {
            SenderState::Start => {
                // Hand the buffer over; the Sender keeps only the fingerprint
                let message = std::mem::take(&mut self.payload);
                debug!(size = message.len(), fingerprint = %self.fingerprint, "payload ready");

                self.transition(SenderState::PayloadSent);
                Ok(Some(Outgoing { to: Party::Receiver, message }))
            },
            SenderState::PayloadSent => {
                let message = match self.seal_fingerprint(env) {
                    Ok(message) => message,
                    Err(err) => {
                        warn!(error = %err, "sender aborted");
                        self.state = SenderState::Aborted;
                        return Err(err);
                    },
                };

                self.transition(SenderState::FingerprintSealed);
                Ok(Some(Outgoing { to: Party::Relay, message }))
            },
            SenderState::FingerprintSealed => {
                self.transition(SenderState::Done);
                Ok(None)
            },
            SenderState::Done | SenderState::Aborted => {
                Err(ProtocolError::InvalidState { operation: "step", state: self.state.as_str() })
            },
        }
    }

    fn seal_fingerprint<E: Environment>(&self, env: &E) -> Result<Bytes, ProtocolError> {
        let sealed = self
            .hop_a
            .seal(self.fingerprint.as_bytes(), env)
            .map_err(|source| ProtocolError::Seal { hop: Hop::SenderRelay, source })?;

        debug!(suite = self.hop_a.suite_name(), size = sealed.encoded_len(), "fingerprint sealed");

        sealed.to_bytes().map_err(|source| ProtocolError::Encode { to: Party::Relay, source })
    }

    fn transition(&mut self, next: SenderState) {
        info!(from = self.state.as_str(), to = next.as_str(), "sender transition");
        self.state = next;
    }
}
