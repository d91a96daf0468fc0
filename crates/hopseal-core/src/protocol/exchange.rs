//! Two-party secured message exchange.
//!
//! A Sender seals a fixed list of messages over one direct channel; the
//! Receiver opens them in arrival order. Works with either an AEAD channel
//! (any message size) or a public-key channel (each message within the key's
//! bound).

use std::collections::VecDeque;

use bytes::Bytes;
use hopseal_proto::{Party, WireMessage};
use tracing::{debug, info, warn};

use super::Outgoing;
use crate::{
    channel::SecureChannel,
    env::Environment,
    error::{Hop, ProtocolError},
};

/// Sending half of the exchange.
#[derive(Debug)]
pub struct ExchangeSender {
    channel: SecureChannel,
    pending: VecDeque<Bytes>,
    sent: usize,
    aborted: bool,
}

impl ExchangeSender {
    /// Queue `messages` for sealing, in order.
    pub fn new(channel: SecureChannel, messages: impl IntoIterator<Item = Bytes>) -> Self {
        Self { channel, pending: messages.into_iter().collect(), sent: 0, aborted: false }
    }

    /// Number of messages emitted so far.
    #[must_use]
    pub fn sent(&self) -> usize {
        self.sent
    }

    /// Seal the next queued message. `Ok(None)` once the queue is drained.
    ///
    /// # Errors
    ///
    /// - `Seal` if the channel cannot carry the message (e.g. it exceeds the
    ///   public-key bound)
    /// - `Encode` if the sealed message cannot be framed
    /// - `InvalidState` once a previous step has failed
    pub fn step<E: Environment>(&mut self, env: &E) -> Result<Option<Outgoing>, ProtocolError> {
        if self.aborted {
            return Err(ProtocolError::InvalidState { operation: "step", state: "aborted" });
        }
        let Some(plaintext) = self.pending.pop_front() else {
            return Ok(None);
        };

        let sealed = self
            .channel
            .seal(&plaintext, env)
            .map_err(|source| ProtocolError::Seal { hop: Hop::SenderReceiver, source })
            .and_then(|message| {
                message
                    .to_bytes()
                    .map_err(|source| ProtocolError::Encode { to: Party::Receiver, source })
            });

        match sealed {
            Ok(message) => {
                self.sent += 1;
                debug!(index = self.sent, size = message.len(), "exchange message sealed");
                Ok(Some(Outgoing { to: Party::Receiver, message }))
            },
            Err(err) => {
                warn!(error = %err, "exchange sender aborted");
                self.aborted = true;
                Err(err)
            },
        }
    }
}

/// Receiving half of the exchange.
#[derive(Debug)]
pub struct ExchangeReceiver {
    channel: SecureChannel,
    expected: usize,
    received: Vec<Bytes>,
    aborted: bool,
}

impl ExchangeReceiver {
    /// Expect `expected` messages over `channel`.
    pub fn new(channel: SecureChannel, expected: usize) -> Self {
        Self { channel, expected, received: Vec::with_capacity(expected), aborted: false }
    }

    /// Returns true once all expected messages have opened.
    #[must_use]
    pub fn is_done(&self) -> bool {
        !self.aborted && self.received.len() == self.expected
    }

    /// Plaintexts opened so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> &[Bytes] {
        &self.received
    }

    /// Consume the receiver, returning every opened plaintext.
    #[must_use]
    pub fn into_messages(self) -> Vec<Bytes> {
        self.received
    }

    /// Open one message and return its plaintext.
    ///
    /// The first failure aborts the exchange; later calls are rejected.
    ///
    /// # Errors
    ///
    /// - `UnexpectedMessage` if `from` is not the Sender, or the exchange
    ///   already completed or aborted
    /// - `Malformed` if the bytes are not a wire message
    /// - `Open` if the channel rejects the message
    pub fn handle_message(&mut self, from: Party, bytes: &[u8]) -> Result<Bytes, ProtocolError> {
        let state = if self.aborted {
            "aborted"
        } else if self.is_done() {
            "done"
        } else {
            "receiving"
        };
        if from != Party::Sender || state != "receiving" {
            let err = ProtocolError::UnexpectedMessage { from, state };
            warn!(error = %err, "exchange receiver rejecting message");
            // A stray message after completion does not undo the exchange
            self.aborted |= state == "receiving";
            return Err(err);
        }

        let opened = WireMessage::decode(bytes)
            .map_err(|source| ProtocolError::Malformed { from, source })
            .and_then(|message| {
                self.channel
                    .open(&message)
                    .map_err(|source| ProtocolError::Open { hop: Hop::SenderReceiver, source })
            });

        match opened {
            Ok(plaintext) => {
                let plaintext = Bytes::from(plaintext);
                self.received.push(plaintext.clone());
                info!(index = self.received.len(), of = self.expected, "exchange message opened");
                Ok(plaintext)
            },
            Err(err) => {
                warn!(error = %err, "exchange receiver aborted");
                self.aborted = true;
                Err(err)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use hopseal_crypto::{CryptoError, MIN_RSA_BITS, OaepPrivateKey, SymmetricKey, SymmetricSuite};

    use super::*;
    use crate::env::test_env::SeededEnv;

    fn channel() -> SecureChannel {
        SecureChannel::aead(SymmetricSuite::Aes256Gcm, SymmetricKey::from_bytes(&[5; 32]).unwrap())
    }

    fn messages(count: usize) -> Vec<Bytes> {
        (0..count).map(|i| Bytes::from(format!("Message {i} from sender to receiver"))).collect()
    }

    #[test]
    fn ten_messages_arrive_in_order() {
        let env = SeededEnv::new(1);
        let mut sender = ExchangeSender::new(channel(), messages(10));
        let mut receiver = ExchangeReceiver::new(channel(), 10);

        while let Some(out) = sender.step(&env).unwrap() {
            assert_eq!(out.to, Party::Receiver);
            receiver.handle_message(Party::Sender, &out.message).unwrap();
        }

        assert_eq!(sender.sent(), 10);
        assert!(receiver.is_done());
        assert_eq!(receiver.into_messages(), messages(10));
    }

    #[test]
    fn single_confidential_message_over_public_key() {
        let env = SeededEnv::new(2);
        let private = OaepPrivateKey::generate(&mut env.rng(), MIN_RSA_BITS).unwrap();
        let text = Bytes::from_static(b"I would like to keep this text confidential");
        let mut sender =
            ExchangeSender::new(SecureChannel::oaep_sealer(private.public_key()), [text.clone()]);
        let mut receiver = ExchangeReceiver::new(SecureChannel::oaep_opener(private), 1);

        let out = sender.step(&env).unwrap().unwrap();
        assert_eq!(receiver.handle_message(Party::Sender, &out.message).unwrap(), text);
        assert!(receiver.is_done());
    }

    #[test]
    fn oversized_public_key_message_aborts_sender() {
        let env = SeededEnv::new(3);
        let private = OaepPrivateKey::generate(&mut env.rng(), MIN_RSA_BITS).unwrap();
        let mut sender = ExchangeSender::new(
            SecureChannel::oaep_sealer(private.public_key()),
            [Bytes::from(vec![0u8; 100])],
        );

        let result = sender.step(&env);
        assert_eq!(
            result,
            Err(ProtocolError::Seal {
                hop: Hop::SenderReceiver,
                source: CryptoError::PayloadTooLarge { size: 100, max: 62 }
            })
        );
        assert!(sender.step(&env).is_err());
    }

    #[test]
    fn tampered_message_aborts_receiver() {
        let env = SeededEnv::new(4);
        let mut sender = ExchangeSender::new(channel(), messages(2));
        let mut receiver = ExchangeReceiver::new(channel(), 2);

        let mut first = sender.step(&env).unwrap().unwrap().message.to_vec();
        first[5] ^= 0x01;
        let result = receiver.handle_message(Party::Sender, &first);
        assert_eq!(
            result,
            Err(ProtocolError::Open {
                hop: Hop::SenderReceiver,
                source: CryptoError::AuthenticationFailure
            })
        );

        // Later messages are refused even if genuine
        let second = sender.step(&env).unwrap().unwrap();
        assert!(receiver.handle_message(Party::Sender, &second.message).is_err());
        assert!(!receiver.is_done());
    }

    #[test]
    fn extra_message_is_unexpected() {
        let env = SeededEnv::new(5);
        let mut sender = ExchangeSender::new(channel(), messages(2));
        let mut receiver = ExchangeReceiver::new(channel(), 1);

        let first = sender.step(&env).unwrap().unwrap();
        receiver.handle_message(Party::Sender, &first.message).unwrap();

        let second = sender.step(&env).unwrap().unwrap();
        assert_eq!(
            receiver.handle_message(Party::Sender, &second.message),
            Err(ProtocolError::UnexpectedMessage { from: Party::Sender, state: "done" })
        );
        assert!(receiver.is_done());
    }
}
