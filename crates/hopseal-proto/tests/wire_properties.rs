//! Property-based tests for wire framing
//!
//! Decoders must never panic on arbitrary input, and stream framing must
//! reassemble the same messages no matter how the bytes are segmented.

use bytes::BytesMut;
use hopseal_proto::{
    WireError, WireMessage,
    stream::{decode_frame, encode_frame},
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn decode_never_panics(bytes in prop::collection::vec(any::<u8>(), 0..1024)) {
        let _ = WireMessage::decode(&bytes);
    }

    #[test]
    fn truncating_an_aead_message_inside_the_nonce_is_detected(
        nonce in prop::collection::vec(any::<u8>(), 2..=32),
        payload in prop::collection::vec(any::<u8>(), 0..64),
        cut in any::<prop::sample::Index>(),
    ) {
        let wire = WireMessage::aead(nonce.clone(), payload).to_bytes().unwrap();
        // Keep the prefix plus a strict subset of the nonce
        let keep = 1 + cut.index(nonce.len());

        let result = WireMessage::decode(&wire[..keep]);
        let is_truncated = matches!(result, Err(WireError::Truncated { .. }));
        prop_assert!(is_truncated);
    }

    #[test]
    fn stream_survives_arbitrary_segmentation(
        messages in prop::collection::vec(prop::collection::vec(any::<u8>(), 0..300), 1..8),
        chunk in 1usize..64,
    ) {
        let mut wire = BytesMut::new();
        for message in &messages {
            encode_frame(message, &mut wire).unwrap();
        }

        let mut received = Vec::new();
        let mut buffer = BytesMut::new();
        for piece in wire.chunks(chunk) {
            buffer.extend_from_slice(piece);
            while let Some(frame) = decode_frame(&mut buffer).unwrap() {
                received.push(frame.to_vec());
            }
        }

        prop_assert_eq!(received, messages);
        prop_assert!(buffer.is_empty());
    }
}
