//! Decode arbitrary input as a tag; anything that decodes must re-encode and
//! decode again to the same payloads.
//!
//! Complements the proptest round trips, which only ever see tags the encoder
//! produced.

#![no_main]

use libfuzzer_sys::fuzz_target;
use vellum_proto::{DecodeOptions, Tag};

// Small ceiling so the fuzzer spends its time in the frame loop
const OPTIONS: DecodeOptions = DecodeOptions::with_max_tag_size(1 << 16);

fuzz_target!(|data: &[u8]| {
    let _ = vellum_proto::peek(data);

    let Ok((tag, consumed)) = Tag::decode_with(data, &OPTIONS) else {
        return;
    };
    assert!(consumed <= data.len());

    // Malformed-but-decodable input may not be encodable (e.g. a v2.3 flag
    // byte the encoder rejects); only what encodes has to survive.
    let Ok(wire) = tag.to_bytes() else {
        return;
    };
    let (again, n) = Tag::decode_with(&wire[..], &OPTIONS).expect("re-encoded tag must decode");
    assert_eq!(n, wire.len());
    // Sizes are recomputed on encode, so compare what the caller sees
    let view = |t: &Tag| t.frames.iter().map(|f| (f.id(), f.header.flags, f.payload.clone())).collect::<Vec<_>>();
    assert_eq!(view(&again), view(&tag));
    assert_eq!(again.padding, tag.padding);
    assert_eq!(again.extended, tag.extended);
});
