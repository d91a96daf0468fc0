//! Logical party addresses.

use std::fmt;

use crate::errors::{Result, WireError};

/// One of the three participants in a relay run.
///
/// Links are addressed by party, never by transport address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Party {
    /// Produces the payload and its fingerprint
    Sender,
    /// Low-bandwidth trusted hop that reseals the fingerprint
    Relay,
    /// Verifies the payload against the relayed fingerprint
    Receiver,
}

impl Party {
    /// All parties, in protocol order.
    pub const ALL: [Self; 3] = [Self::Sender, Self::Relay, Self::Receiver];

    /// Stable lowercase name, used in logs and as simulated host names.
    pub fn name(self) -> &'static str {
        match self {
            Self::Sender => "sender",
            Self::Relay => "relay",
            Self::Receiver => "receiver",
        }
    }

    /// One-byte tag used when a transport must identify the origin.
    pub fn to_u8(self) -> u8 {
        match self {
            Self::Sender => 0x01,
            Self::Relay => 0x02,
            Self::Receiver => 0x03,
        }
    }

    /// Parse a tag written by [`Party::to_u8`].
    ///
    /// # Errors
    ///
    /// - `WireError::UnknownParty` for any other byte
    pub fn from_u8(tag: u8) -> Result<Self> {
        match tag {
            0x01 => Ok(Self::Sender),
            0x02 => Ok(Self::Relay),
            0x03 => Ok(Self::Receiver),
            other => Err(WireError::UnknownParty(other)),
        }
    }
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
