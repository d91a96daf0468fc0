//! Fuzz target for stream framing under arbitrary segmentation
//!
//! # Strategy
//!
//! - Encode a sequence of messages, then feed the byte stream to
//!   `decode_frame` in arbitrary chunk sizes
//! - Separately, feed raw arbitrary bytes as a hostile stream
//!
//! # Invariants
//!
//! - Messages come out whole and in order regardless of chunking
//! - An incomplete frame consumes nothing
//! - A hostile length prefix is an error, never a panic or an allocation of
//!   the claimed size

#![no_main]

use arbitrary::Arbitrary;
use bytes::BytesMut;
use hopseal_proto::stream::{decode_frame, encode_frame};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct Scenario {
    messages: Vec<Vec<u8>>,
    chunks: Vec<u8>,
    hostile: Vec<u8>,
}

fuzz_target!(|scenario: Scenario| {
    let mut stream = Vec::new();
    for message in &scenario.messages {
        encode_frame(message, &mut stream).expect("small frames encode");
    }

    let mut buffer = BytesMut::new();
    let mut decoded = Vec::new();
    let mut offset = 0;
    let mut chunks = scenario.chunks.iter().cycle();
    while offset < stream.len() {
        let step = usize::from(chunks.next().copied().unwrap_or(u8::MAX)).max(1);
        let end = (offset + step).min(stream.len());
        buffer.extend_from_slice(&stream[offset..end]);
        offset = end;

        loop {
            let before = buffer.len();
            match decode_frame(&mut buffer).expect("well-formed stream") {
                Some(frame) => decoded.push(frame.to_vec()),
                None => {
                    assert_eq!(buffer.len(), before, "incomplete frame must not be consumed");
                    break;
                },
            }
        }
    }

    assert_eq!(decoded, scenario.messages);
    assert!(buffer.is_empty());

    let mut hostile = BytesMut::from(scenario.hostile.as_slice());
    while let Ok(Some(_)) = decode_frame(&mut hostile) {}
});
