//! Property tests for whole relay runs over the tokio runtime.
//!
//! 1. Any payload size up to a few KiB runs to `Valid` and delivers the bytes
//! 2. Any bit flipped on a non-empty payload link gives `Invalid`
//! 3. Any bit flipped on hop B aborts the Receiver with an indeterminate
//!    integrity verdict
//! 4. Any bit flipped on hop A fails the run at the Relay

use std::sync::{Arc, Mutex};

use bytes::Bytes;
use hopseal_core::{Outcome, ProtocolError, env::Environment};
use hopseal_crypto::MIN_RSA_BITS;
use hopseal_proto::Party;
use hopseal_runtime::{Faults, HopKeys, RelayKeys, RelayReport, RuntimeError, SuiteKind};
use proptest::prelude::*;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;

#[derive(Clone)]
struct SeededEnv(Arc<Mutex<ChaCha20Rng>>);

impl Environment for SeededEnv {
    fn random_bytes(&self, buffer: &mut [u8]) {
        self.0.lock().unwrap().fill_bytes(buffer);
    }
}

fn run(seed: u64, payload: Vec<u8>, faults: Faults) -> Result<RelayReport, RuntimeError> {
    let env = SeededEnv(Arc::new(Mutex::new(ChaCha20Rng::seed_from_u64(seed))));
    let mut rng = env.rng();
    let hop_a = HopKeys::generate(SuiteKind::ChaCha20Poly1305, MIN_RSA_BITS, &mut rng).unwrap();
    let hop_b = HopKeys::generate(SuiteKind::Aes256Gcm, MIN_RSA_BITS, &mut rng).unwrap();
    let keys = RelayKeys::from_hops(hop_a, hop_b);

    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    runtime.block_on(hopseal_runtime::run_relay_protocol(keys, Bytes::from(payload), env, faults))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_untouched_run_is_valid(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 0..4096),
    ) {
        let report = run(seed, payload.clone(), Faults::none()).unwrap();

        prop_assert_eq!(report.outcome, Outcome::Valid);
        prop_assert_eq!(report.payload, Some(Bytes::from(payload)));
    }

    #[test]
    fn prop_flipped_payload_bit_is_invalid(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 1..4096),
        bit in any::<usize>(),
    ) {
        let faults = Faults::none().flip_bit(Party::Sender, Party::Receiver, bit);
        let report = run(seed, payload, faults).unwrap();

        prop_assert_eq!(report.outcome, Outcome::Invalid);
        prop_assert_eq!(report.payload, None);
    }

    #[test]
    fn prop_flipped_hop_b_bit_aborts(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 0..1024),
        bit in any::<usize>(),
    ) {
        let faults = Faults::none().flip_bit(Party::Relay, Party::Receiver, bit);
        let report = run(seed, payload, faults).unwrap();

        let indeterminate = matches!(
            report.outcome,
            Outcome::Aborted { reason: ProtocolError::IntegrityIndeterminate { .. } }
        );
        prop_assert!(indeterminate, "bit {}: {:?}", bit, report.outcome);
        prop_assert_eq!(report.payload, None);
    }

    #[test]
    fn prop_flipped_hop_a_bit_fails_the_run(
        seed in any::<u64>(),
        payload in prop::collection::vec(any::<u8>(), 0..1024),
        bit in any::<usize>(),
    ) {
        let faults = Faults::none().flip_bit(Party::Sender, Party::Relay, bit);
        let result = run(seed, payload, faults);

        let aborted = result.as_ref().is_err_and(RuntimeError::is_protocol_abort);
        prop_assert!(aborted, "bit {}: {:?}", bit, result);
    }
}
