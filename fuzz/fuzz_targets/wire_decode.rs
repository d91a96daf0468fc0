//! Fuzz target for WireMessage::decode
//!
//! Arbitrary bytes must never panic the decoder. Anything that decodes must
//! re-encode to exactly the input: the format has one encoding per message.

#![no_main]

use hopseal_proto::WireMessage;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(message) = WireMessage::decode(data) else {
        return;
    };

    assert_eq!(message.encoded_len(), data.len());
    let encoded = message.to_bytes().expect("decoded message must re-encode");
    assert_eq!(encoded.as_ref(), data);
});
