//! Hopseal wire protocol.
//!
//! Byte-level layout for everything that crosses a link between parties:
//!
//! - [`WireMessage`]: a sealed channel message, `[nonce_len][nonce][payload]`
//! - [`stream`]: length-prefixed framing for byte-stream transports
//! - [`Party`]: logical addresses of the three participants
//!
//! This crate provides structural validity only. It never decrypts or
//! authenticates; a well-formed [`WireMessage`] may still fail to open.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod errors;
pub mod party;
pub mod stream;
pub mod wire;

pub use errors::{Result, WireError};
pub use party::Party;
pub use wire::{MAX_MESSAGE_SIZE, MAX_NONCE_SIZE, WireMessage};
