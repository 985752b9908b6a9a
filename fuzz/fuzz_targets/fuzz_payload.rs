#![no_main]

use bat_token::core::v1::TokenV1;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz the V1 payload parser directly, bypassing the text layer
    if let Ok(token) = TokenV1::from_payload(data) {
        let bytes = token.to_bytes().expect("parsed token re-serializes");
        assert_eq!(&bytes[1..], data);
    }
});
