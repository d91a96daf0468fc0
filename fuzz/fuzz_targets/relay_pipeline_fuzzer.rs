//! Fuzz target for the three-party relay pipeline
//!
//! Drives Sender, Relay and Receiver actors in memory with arbitrary
//! payloads, arrival orders and in-transit tampering.
//!
//! # Invariants
//!
//! - No actor panics on any input
//! - Untampered runs are `Valid` and deliver the payload
//! - A tampered payload with untouched hops is `Invalid`, never `Valid`
//! - Tampering with hop A stops the Relay; the Receiver reaches no outcome
//! - Tampering with hop B is `Aborted`, never `Valid` or `Invalid`

#![no_main]

use std::sync::{Arc, Mutex};

use arbitrary::Arbitrary;
use bytes::Bytes;
use hopseal_core::{
    env::Environment, Outcome, ReceiverActor, RelayActor, SecureChannel, SenderActor,
};
use hopseal_crypto::{SymmetricKey, SymmetricSuite};
use hopseal_proto::Party;
use libfuzzer_sys::fuzz_target;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[derive(Clone)]
struct FuzzEnv(Arc<Mutex<ChaCha20Rng>>);

impl Environment for FuzzEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.0.lock().unwrap().fill_bytes(buffer);
    }
}

#[derive(Debug, Arbitrary)]
enum Link {
    Payload,
    HopA,
    HopB,
}

#[derive(Debug, Arbitrary)]
struct Tamper {
    link: Link,
    bit: u32,
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    payload: Vec<u8>,
    fingerprint_first: bool,
    tamper: Option<Tamper>,
}

fn flip(bytes: Bytes, bit: u32) -> Bytes {
    if bytes.is_empty() {
        return bytes;
    }
    let mut flipped = bytes.to_vec();
    let bit = bit as usize % (flipped.len() * 8);
    flipped[bit / 8] ^= 1 << (bit % 8);
    Bytes::from(flipped)
}

fuzz_target!(|scenario: Scenario| {
    let env = FuzzEnv(Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(scenario.seed))));
    let hop_a = SymmetricKey::generate(&mut env.rng());
    let hop_b = SymmetricKey::generate(&mut env.rng());

    let mut sender = SenderActor::new(
        SecureChannel::aead(SymmetricSuite::ChaCha20Poly1305, hop_a.clone()),
        scenario.payload.clone(),
    );
    let mut relay = RelayActor::new(
        SecureChannel::aead(SymmetricSuite::ChaCha20Poly1305, hop_a),
        SecureChannel::aead(SymmetricSuite::Aes256Gcm, hop_b.clone()),
    );
    let mut receiver = ReceiverActor::new(SecureChannel::aead(SymmetricSuite::Aes256Gcm, hop_b));

    let tamper = |link: Link, bytes: Bytes| -> Bytes {
        match &scenario.tamper {
            Some(t) if std::mem::discriminant(&t.link) == std::mem::discriminant(&link) => {
                flip(bytes, t.bit)
            },
            _ => bytes,
        }
    };

    let payload = sender.step(&env).expect("payload step").expect("payload message");
    let sealed = sender.step(&env).expect("seal step").expect("sealed message");
    assert_eq!(payload.to, Party::Receiver);
    assert_eq!(sealed.to, Party::Relay);

    let payload = tamper(Link::Payload, payload.message);
    let sealed = tamper(Link::HopA, sealed.message);

    let resealed = match relay.handle_message(Party::Sender, &sealed, &env) {
        Ok(outgoing) => Some(tamper(Link::HopB, outgoing.message)),
        Err(_) => {
            assert!(matches!(scenario.tamper, Some(Tamper { link: Link::HopA, .. })));
            None
        },
    };

    let mut outcome = None;
    if scenario.fingerprint_first {
        if let Some(resealed) = resealed.clone() {
            outcome = outcome.or(receiver.handle_message(Party::Relay, resealed));
        }
        outcome = outcome.or(receiver.handle_message(Party::Sender, payload));
    } else {
        outcome = outcome.or(receiver.handle_message(Party::Sender, payload));
        if let Some(resealed) = resealed.clone() {
            outcome = outcome.or(receiver.handle_message(Party::Relay, resealed));
        }
    }

    match (&scenario.tamper, outcome) {
        (None, Some(Outcome::Valid)) => {
            assert_eq!(receiver.into_payload().as_deref(), Some(scenario.payload.as_slice()));
        },
        (Some(Tamper { link: Link::Payload, .. }), Some(Outcome::Invalid)) => {
            assert!(!scenario.payload.is_empty());
        },
        (Some(Tamper { link: Link::Payload, .. }), Some(Outcome::Valid)) => {
            // Flipping the bit of an empty payload is a no-op
            assert!(scenario.payload.is_empty());
        },
        (Some(Tamper { link: Link::HopA, .. }), None) => assert!(resealed.is_none()),
        (Some(Tamper { link: Link::HopB, .. }), Some(Outcome::Aborted { .. })) => {},
        (tamper, outcome) => panic!("tamper {tamper:?} produced outcome {outcome:?}"),
    }
});
