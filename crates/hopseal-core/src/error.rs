//! Error types for the hopseal protocol core.
//!
//! Every error here is terminal for the actor that raised it: cryptographic
//! and structural failures are deterministic, so nothing is retried. The
//! Receiver folds them into [`crate::Outcome::Aborted`]; the Sender and Relay
//! return them to their driver.

use std::fmt;

use hopseal_crypto::CryptoError;
use hopseal_proto::{Party, WireError};
use thiserror::Error;

/// A secured leg between two parties, bound to one key and one suite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hop {
    /// Hop A: Sender to Relay
    SenderRelay,
    /// Hop B: Relay to Receiver
    RelayReceiver,
    /// Direct secured link, used by the two-party exchange
    SenderReceiver,
}

impl Hop {
    /// Sealing and opening ends of this hop.
    pub fn endpoints(self) -> (Party, Party) {
        match self {
            Self::SenderRelay => (Party::Sender, Party::Relay),
            Self::RelayReceiver => (Party::Relay, Party::Receiver),
            Self::SenderReceiver => (Party::Sender, Party::Receiver),
        }
    }
}

impl fmt::Display for Hop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (from, to) = self.endpoints();
        write!(f, "{from}->{to}")
    }
}

/// Errors that abort an actor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The relayed fingerprint did not open at the Receiver, so the payload
    /// can be neither accepted nor rejected
    #[error("integrity indeterminate: relayed fingerprint failed to open: {source}")]
    IntegrityIndeterminate {
        /// Underlying adapter failure
        source: CryptoError,
    },

    /// Sealing failed on the given hop
    #[error("seal failed on {hop}: {source}")]
    Seal {
        /// Hop being sealed for
        hop: Hop,
        /// Underlying adapter failure
        source: CryptoError,
    },

    /// Opening failed on the given hop
    #[error("open failed on {hop}: {source}")]
    Open {
        /// Hop the message arrived on
        hop: Hop,
        /// Underlying adapter failure
        source: CryptoError,
    },

    /// Received bytes are not a well-formed wire message
    #[error("malformed message from {from}: {source}")]
    Malformed {
        /// Party that sent the bytes
        from: Party,
        /// Framing error
        source: WireError,
    },

    /// Outgoing message could not be framed
    #[error("cannot encode message for {to}: {source}")]
    Encode {
        /// Intended recipient
        to: Party,
        /// Framing error
        source: WireError,
    },

    /// Message arrived from a party, or in a state, the protocol does not
    /// allow
    #[error("unexpected message from {from} in state {state}")]
    UnexpectedMessage {
        /// Party that sent the message
        from: Party,
        /// State the actor was in
        state: &'static str,
    },

    /// Operation attempted from a state that does not allow it
    #[error("invalid state transition: cannot {operation} from {state}")]
    InvalidState {
        /// Operation that was attempted
        operation: &'static str,
        /// State the actor was in
        state: &'static str,
    },
}

impl ProtocolError {
    /// Adapter failure underneath this error, if any.
    pub fn crypto_cause(&self) -> Option<&CryptoError> {
        match self {
            Self::IntegrityIndeterminate { source }
            | Self::Seal { source, .. }
            | Self::Open { source, .. } => Some(source),
            Self::Malformed { .. }
            | Self::Encode { .. }
            | Self::UnexpectedMessage { .. }
            | Self::InvalidState { .. } => None,
        }
    }

    /// Returns true if this error means a peer or link delivered forged or
    /// corrupted bytes.
    ///
    /// Local failures (sealing, encoding, state misuse) are bugs or
    /// configuration errors instead.
    pub fn is_peer_fault(&self) -> bool {
        match self {
            Self::IntegrityIndeterminate { .. }
            | Self::Open { .. }
            | Self::Malformed { .. }
            | Self::UnexpectedMessage { .. } => true,
            Self::Seal { .. } | Self::Encode { .. } | Self::InvalidState { .. } => false,
        }
    }
}
