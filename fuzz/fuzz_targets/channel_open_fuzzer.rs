//! Fuzz target for SecureChannel::open
//!
//! # Strategy
//!
//! - Seal an arbitrary plaintext, then open either the genuine message, a
//!   mutated copy, or a message built from raw bytes
//!
//! # Invariants
//!
//! - Opening never panics
//! - The genuine message opens to the plaintext
//! - A mutated message never opens to anything: AEAD tags catch every
//!   change to nonce or ciphertext

#![no_main]

use std::sync::{Arc, Mutex};

use arbitrary::Arbitrary;
use hopseal_core::{env::Environment, SecureChannel};
use hopseal_crypto::{SymmetricKey, SymmetricSuite};
use hopseal_proto::WireMessage;
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
enum Suite {
    Aes256Gcm,
    ChaCha20Poly1305,
}

#[derive(Debug, Arbitrary)]
enum Delivery {
    Genuine,
    FlipBit { bit: u16 },
    Truncate { keep: u16 },
    Raw { nonce: Vec<u8>, payload: Vec<u8> },
}

#[derive(Debug, Arbitrary)]
struct Scenario {
    seed: u64,
    suite: Suite,
    plaintext: Vec<u8>,
    delivery: Delivery,
}

fuzz_target!(|scenario: Scenario| {
    let env = FuzzEnv(Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(scenario.seed))));
    let suite = match scenario.suite {
        Suite::Aes256Gcm => SymmetricSuite::Aes256Gcm,
        Suite::ChaCha20Poly1305 => SymmetricSuite::ChaCha20Poly1305,
    };
    let channel = SecureChannel::aead(suite, SymmetricKey::generate(&mut env.rng()));
    let sealed = channel.seal(&scenario.plaintext, &env).expect("seal must succeed");
    let wire = sealed.to_bytes().expect("sealed message encodes").to_vec();

    match scenario.delivery {
        Delivery::Genuine => {
            let opened = channel.open(&sealed).expect("genuine message opens");
            assert_eq!(opened, scenario.plaintext);
        },
        Delivery::FlipBit { bit } => {
            let mut mutated = wire;
            // Byte 0 is the nonce length; flipping it is a framing change
            let bit = usize::from(bit) % ((mutated.len() - 1) * 8) + 8;
            mutated[bit / 8] ^= 1 << (bit % 8);
            let message = WireMessage::decode(&mutated).expect("length prefix untouched");
            assert!(channel.open(&message).is_err(), "mutated message must not open");
        },
        Delivery::Truncate { keep } => {
            let keep = usize::from(keep) % wire.len();
            if let Ok(message) = WireMessage::decode(&wire[..keep]) {
                assert!(channel.open(&message).is_err(), "truncated message must not open");
            }
        },
        Delivery::Raw { nonce, payload } => {
            let message = if nonce.is_empty() {
                WireMessage::sealed(payload)
            } else {
                WireMessage::aead(nonce, payload)
            };
            let _ = channel.open(&message);
        },
    }
});
