//! Sans-IO protocol actors.
//!
//! Each actor is a pure state machine: the driver feeds it `(from, bytes)`
//! and delivers the [`Outgoing`] messages it returns. Actors never block,
//! never touch a socket and never read a clock, so the same code runs under
//! the tokio runtime and the turmoil simulation.
//!
//! # Relay Protocol
//!
//! ```text
//! Sender:   Start ──> PayloadSent ──> FingerprintSealed ──> Done
//! Relay:    WaitForSealedFingerprint ──> Reseal ──> Forward ──> Done
//! Receiver: Waiting (payload ∥ fingerprint) ──> Verify ──> Done
//!
//! Any actor: ── crypto / framing failure ──> Aborted
//! ```

mod exchange;
mod receiver;
mod relay;
mod sender;

use std::fmt;

use bytes::Bytes;
use hopseal_proto::Party;

pub use self::{
    exchange::{ExchangeReceiver, ExchangeSender},
    receiver::{ReceiverActor, ReceiverState},
    relay::{RelayActor, RelayState},
    sender::{SenderActor, SenderState},
};
use crate::error::ProtocolError;

/// Message an actor asks its driver to deliver.
///
/// The bytes are owned: once handed over, the emitting actor keeps no
/// reference to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    /// Destination party
    pub to: Party,
    /// Opaque bytes for the link
    pub message: Bytes,
}

/// Terminal result of a Receiver run.
///
/// `Valid` and `Invalid` are both successful completions; only `Aborted`
/// means the protocol could not reach a verdict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Payload fingerprint matches the relayed fingerprint
    Valid,
    /// Fingerprints differ: the payload was altered in transit
    Invalid,
    /// No verdict could be reached
    Aborted {
        /// Why the Receiver gave up
        reason: ProtocolError,
    },
}

impl Outcome {
    /// Returns true only for [`Outcome::Valid`].
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    /// Abort reason, if the protocol did not reach a verdict.
    pub fn abort_reason(&self) -> Option<&ProtocolError> {
        match self {
            Self::Aborted { reason } => Some(reason),
            Self::Valid | Self::Invalid => None,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid => f.write_str("data valid"),
            Self::Invalid => f.write_str("data invalid"),
            Self::Aborted { reason } => write!(f, "aborted: {reason}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use hopseal_crypto::CryptoError;

    use super::*;

    #[test]
    fn only_valid_is_valid() {
        assert!(Outcome::Valid.is_valid());
        assert!(!Outcome::Invalid.is_valid());

        let aborted = Outcome::Aborted {
            reason: ProtocolError::IntegrityIndeterminate {
                source: CryptoError::AuthenticationFailure,
            },
        };
        assert!(!aborted.is_valid());
        assert!(aborted.abort_reason().is_some());
    }

    #[test]
    fn outcome_display() {
        assert_eq!(Outcome::Valid.to_string(), "data valid");
        assert_eq!(Outcome::Invalid.to_string(), "data invalid");
    }
}
