#![no_main]

use bat_token::Token;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Fuzz token parsing - test for panics and out-of-bounds reads
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(token) = Token::parse(s) {
            // Anything that parses must re-encode and verify deterministically
            let _ = token.verify(b"fuzz");
            let _ = token.encode();
        }
    }
});
