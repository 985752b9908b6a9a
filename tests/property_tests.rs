//! Property-based tests using proptest
//!
//! These tests validate token invariants across a wide range of randomly
//! generated field combinations.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use bat_token::core::fields::{is_bit_set, set_bit};
use bat_token::core::text;
use bat_token::{IpBinding, IpVersion, Token, TokenV1, TokenV1Builder};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn arb_ip_binding() -> impl Strategy<Value = IpBinding> {
    (prop_oneof![Just(IpVersion::V4), Just(IpVersion::V6)], any::<u32>())
        .prop_map(|(version, hash)| IpBinding::new(version, hash))
}

prop_compose! {
    fn arb_builder()(
        app_id in any::<u32>(),
        token_id in any::<u32>(),
        subtoken_id in proptest::option::of(any::<u32>()),
        expire_at in proptest::option::of(any::<i32>()),
        limits in proptest::option::of((0.0f32..1.0e6, any::<u8>(), any::<bool>())),
        ip in proptest::option::of(arb_ip_binding()),
        webhooks in any::<bool>(),
    ) -> TokenV1Builder {
        let mut b = TokenV1::builder(app_id, token_id).with_webhooks_enabled(webhooks);
        if let Some(id) = subtoken_id {
            b = b.with_subtoken_id(id);
        }
        if let Some(secs) = expire_at {
            b = b.with_expire_at(Utc.timestamp_opt(i64::from(secs), 0).unwrap());
        }
        if let Some((rps, burst, per_ip)) = limits {
            b = b.with_rate_limits(rps, burst, per_ip);
        }
        if let Some(binding) = ip {
            b = b.with_ip_binding(binding);
        }
        b
    }
}

// Property: every valid field combination survives sign -> encode -> parse
proptest! {
    #[test]
    fn prop_token_roundtrip(builder in arb_builder(), secret in prop::collection::vec(any::<u8>(), 0..64)) {
        let token = builder.sign(&secret).expect("valid builder must sign");
        let s = token.encode().expect("signed token must encode");
        let parsed = Token::parse(&s).expect("own output must parse").into_v1().unwrap();

        prop_assert_eq!(&parsed, &token);
        prop_assert!(parsed.verify(&secret));
    }
}

// Property: a different secret never verifies
proptest! {
    #[test]
    fn prop_wrong_secret_fails(
        builder in arb_builder(),
        // HMAC zero-pads short keys, so keys differing only by trailing
        // zero bytes are equivalent; keep zeros out of both
        secret in prop::collection::vec(1u8.., 1..64),
        other in prop::collection::vec(1u8.., 1..64),
    ) {
        prop_assume!(secret != other);
        let token = builder.sign(&secret).unwrap();
        let parsed = Token::parse(&token.encode().unwrap()).unwrap();
        prop_assert!(!parsed.verify(&other));
    }
}

// Property: truncated text either fails to parse or fails verification
proptest! {
    #[test]
    fn prop_truncation_never_verifies(builder in arb_builder(), cut in 1usize..120) {
        let token = builder.sign(b"secret").unwrap();
        let s = token.encode().unwrap();
        let keep = s.len().saturating_sub(cut);
        match Token::parse(&s[..keep]) {
            Err(e) => prop_assert!(e.is_format_error()),
            Ok(parsed) => prop_assert!(!parsed.verify(b"secret")),
        }
    }
}

// Property: flipping any bit of the signed binary never yields a verified token
proptest! {
    #[test]
    fn prop_bit_flip_never_verifies(builder in arb_builder(), pos in any::<prop::sample::Index>(), bit in 0u8..8) {
        let token = builder.sign(b"secret").unwrap();
        let mut bytes = token.to_bytes().unwrap();
        let i = pos.index(bytes.len());
        bytes[i] ^= 1 << bit;
        if let Ok(parsed) = Token::parse(&text::encode(&bytes)) {
            prop_assert!(!parsed.verify(b"secret"));
        }
    }
}

// Property: a subtoken always carries its 4-byte id right after the presence byte
proptest! {
    #[test]
    fn prop_subtoken_block_position(builder in arb_builder(), id in any::<u32>()) {
        let token = builder.with_subtoken_id(id).sign(b"k").unwrap();
        let bytes = token.to_bytes().unwrap();
        prop_assert_eq!(bytes[9], 1);
        prop_assert_eq!(&bytes[10..14], &id.to_be_bytes()[..]);
    }
}

// Property: parsing arbitrary text never panics
proptest! {
    #[test]
    fn prop_parse_never_panics(s in "[A-Za-z2-7=]{0,128}") {
        let _ = Token::parse(&s);
    }
}

// Property: parsing arbitrary bytes behind a V1 version byte never panics
proptest! {
    #[test]
    fn prop_parse_random_payload_never_panics(payload in prop::collection::vec(any::<u8>(), 0..96)) {
        let mut bytes = vec![1u8];
        bytes.extend(payload);
        let _ = Token::parse(&text::encode(&bytes));
    }
}

// Property: set_bit/is_bit_set agree and stay within one bit
proptest! {
    #[test]
    fn prop_flag_bits(word in any::<u16>(), bit in 0u8..32) {
        let set = set_bit(word, bit);
        if bit <= 15 {
            prop_assert!(is_bit_set(set, bit));
            prop_assert!((set ^ word).count_ones() <= 1);
        } else {
            prop_assert_eq!(set, word);
            prop_assert!(!is_bit_set(set, bit));
        }
    }
}

// Property: text encoding is lossless and unpadded
proptest! {
    #[test]
    fn prop_text_roundtrip(data in prop::collection::vec(any::<u8>(), 0..128)) {
        let s = text::encode(&data);
        prop_assert!(!s.contains('='));
        prop_assert_eq!(text::decode(&s).unwrap(), data.clone());
        prop_assert_eq!(text::decode(&s.to_ascii_lowercase()).unwrap(), data);
    }
}
