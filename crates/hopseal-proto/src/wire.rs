//! Sealed channel message and its byte layout.
//!
//! Layout on the wire:
//! `[nonce_len: u8][nonce: nonce_len bytes][payload: remaining bytes]`
//!
//! `nonce_len` is 0 for public-key channels, which carry no nonce. The payload
//! is ciphertext‖tag for AEAD channels and the raw OAEP block otherwise.

use bytes::{BufMut, Bytes, BytesMut};

use crate::errors::{Result, WireError};

/// Largest encoded message accepted in either direction (16 MiB)
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Largest nonce the one-byte prefix can describe
pub const MAX_NONCE_SIZE: usize = u8::MAX as usize;

/// Size of the nonce length prefix
const NONCE_PREFIX_SIZE: usize = 1;

/// A sealed message as produced by one secure channel and consumed by its
/// peer.
///
/// # Invariants
///
/// - An empty nonce means "no nonce": [`WireMessage::nonce`] returns `None`
/// - The nonce never exceeds [`MAX_NONCE_SIZE`] bytes once encoded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    nonce: Bytes,
    payload: Bytes,
}

impl WireMessage {
    /// Message from an AEAD channel: the nonce travels with the ciphertext.
    pub fn aead(nonce: impl Into<Bytes>, payload: impl Into<Bytes>) -> Self {
        let nonce = nonce.into();
        debug_assert!(!nonce.is_empty(), "AEAD messages always carry a nonce");
        Self { nonce, payload: payload.into() }
    }

    /// Message from a public-key channel: no nonce field.
    pub fn sealed(payload: impl Into<Bytes>) -> Self {
        Self { nonce: Bytes::new(), payload: payload.into() }
    }

    /// Nonce, if the producing channel uses one.
    pub fn nonce(&self) -> Option<&[u8]> {
        (!self.nonce.is_empty()).then_some(self.nonce.as_ref())
    }

    /// Ciphertext (including tag or padding).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Number of bytes [`WireMessage::encode`] writes.
    pub fn encoded_len(&self) -> usize {
        NONCE_PREFIX_SIZE + self.nonce.len() + self.payload.len()
    }

    /// Encode into `dst`.
    ///
    /// # Errors
    ///
    /// - `NonceTooLong` if the nonce exceeds [`MAX_NONCE_SIZE`]
    /// - `TooLarge` if the encoded message exceeds [`MAX_MESSAGE_SIZE`]
    pub fn encode(&self, dst: &mut impl BufMut) -> Result<()> {
        let nonce_len = u8::try_from(self.nonce.len())
            .map_err(|_| WireError::NonceTooLong { len: self.nonce.len() })?;

        let size = self.encoded_len();
        if size > MAX_MESSAGE_SIZE {
            return Err(WireError::TooLarge { size, max: MAX_MESSAGE_SIZE });
        }

        dst.put_u8(nonce_len);
        dst.put_slice(&self.nonce);
        dst.put_slice(&self.payload);

        Ok(())
    }

    /// Encode into a fresh buffer.
    ///
    /// # Errors
    ///
    /// Same as [`WireMessage::encode`].
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Decode from wire bytes. The whole input is the message; there is no
    /// trailing data.
    ///
    /// # Errors
    ///
    /// - `TooLarge` if `bytes` exceeds [`MAX_MESSAGE_SIZE`]
    /// - `Truncated` if `bytes` is empty or shorter than the nonce prefix
    ///   claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > MAX_MESSAGE_SIZE {
            return Err(WireError::TooLarge { size: bytes.len(), max: MAX_MESSAGE_SIZE });
        }

        let Some((&nonce_len, rest)) = bytes.split_first() else {
            return Err(WireError::Truncated { expected: NONCE_PREFIX_SIZE, actual: 0 });
        };

        let nonce_len = usize::from(nonce_len);
        if rest.len() < nonce_len {
            return Err(WireError::Truncated {
                expected: NONCE_PREFIX_SIZE + nonce_len,
                actual: bytes.len(),
            });
        }

        let (nonce, payload) = rest.split_at(nonce_len);

        Ok(Self { nonce: Bytes::copy_from_slice(nonce), payload: Bytes::copy_from_slice(payload) })
    }
}
