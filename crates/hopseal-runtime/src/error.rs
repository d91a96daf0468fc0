//! Runtime error types.

use hopseal_core::ProtocolError;
use hopseal_crypto::CryptoError;
use hopseal_proto::Party;
use thiserror::Error;

use crate::config::ConfigError;

/// Link-level failures inside the in-process [`Network`](crate::Network).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// No link was connected between the two parties
    #[error("no link from {from} to {to}")]
    NotConnected {
        /// Sending party
        from: Party,
        /// Receiving party
        to: Party,
    },

    /// The destination endpoint was dropped; the message is lost
    #[error("{to} is no longer receiving")]
    PeerGone {
        /// Receiving party
        to: Party,
    },

    /// The party's endpoint was already handed out
    #[error("endpoint for {0} already taken")]
    EndpointTaken(Party),
}

/// Errors surfaced by the runtime and the CLI.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Key bootstrap failed
    #[error("key generation failed: {0}")]
    KeyGeneration(#[from] CryptoError),

    /// Link failure
    #[error("link error: {0}")]
    Link(#[from] LinkError),

    /// An actor aborted
    #[error("{party} aborted: {source}")]
    Protocol {
        /// Actor that aborted
        party: Party,
        /// Why it aborted
        source: ProtocolError,
    },

    /// An actor task panicked or was cancelled
    #[error("{party} task failed: {reason}")]
    Task {
        /// Actor whose task failed
        party: Party,
        /// Join error description
        reason: String,
    },
}

impl RuntimeError {
    /// Returns true if the failure comes from the protocol itself (forged,
    /// corrupted or misrouted bytes) rather than from setup or the runtime.
    pub fn is_protocol_abort(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// Protocol error underneath, if any.
    pub fn protocol_error(&self) -> Option<&ProtocolError> {
        match self {
            Self::Protocol { source, .. } => Some(source),
            Self::Config(_) | Self::KeyGeneration(_) | Self::Link(_) | Self::Task { .. } => None,
        }
    }
}
