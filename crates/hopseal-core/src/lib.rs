//! Hopseal protocol core.
//!
//! Secure channels and the three-party relay protocol, with no I/O. Actors
//! take bytes in and hand back [`Outgoing`] messages for a driver to deliver;
//! the driver owns scheduling, links and time.
//!
//! # Data Flow
//!
//! ```text
//!            payload (plain, untrusted, high bandwidth)
//!   Sender ───────────────────────────────────────────────> Receiver
//!     │                                                        ▲
//!     │ seal(fingerprint) on hop A          seal(fingerprint) on hop B
//!     ▼                                                        │
//!   Relay ── open (hop A) ── reseal (hop B) ───────────────────┘
//! ```
//!
//! The Receiver hashes the payload it got, opens the relayed fingerprint and
//! compares. A mismatch is a legitimate [`Outcome::Invalid`]; a fingerprint
//! that fails to open is [`Outcome::Aborted`] with
//! [`ProtocolError::IntegrityIndeterminate`].
//!
//! # Components
//!
//! - [`env::Environment`]: randomness seam (OS RNG in production, seeded RNG
//!   in simulation)
//! - [`SecureChannel`]: one key plus one suite bound to a link
//! - [`protocol`]: Sender, Relay and Receiver state machines, plus the
//!   two-party message exchange

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod channel;
pub mod env;
pub mod error;
pub mod protocol;

pub use channel::SecureChannel;
pub use error::{Hop, ProtocolError};
pub use protocol::{
    ExchangeReceiver, ExchangeSender, Outcome, Outgoing, ReceiverActor, ReceiverState,
    RelayActor, RelayState, SenderActor, SenderState,
};
