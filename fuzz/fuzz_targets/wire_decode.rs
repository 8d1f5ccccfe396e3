//! Fuzz target for WireEvent::from_json
//!
//! This fuzzer tests wire event deserialization with:
//! - Malformed JSON
//! - Unknown or missing `kind` tags
//! - Wrong field types and truncated UUIDs
//! - Deeply nested or oversized documents
//!
//! The fuzzer should NEVER panic. All invalid inputs should return an
//! error, and anything that decodes must survive a re-encode.

#![no_main]

use libfuzzer_sys::fuzz_target;
use pairlink_proto::WireEvent;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };

    // Decoding arbitrary text must never panic
    let Ok(event) = WireEvent::from_json(text) else {
        return;
    };

    // Anything that decoded must re-encode, and the re-encoded form must
    // decode to the same event.
    let encoded = event.to_json().expect("decoded event must re-encode");
    let round = WireEvent::from_json(&encoded).expect("re-encoded event must decode");
    assert_eq!(event, round);
});
