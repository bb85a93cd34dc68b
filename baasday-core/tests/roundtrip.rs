//! Property-based tests for the wire codec.
//!
//! Any field map built from finite numbers and millisecond-resolution
//! timestamps must decode back to itself after encoding.

use baasday_core::{
    codec,
    value::{Number, Value, ValueMap},
};
use chrono::DateTime;
use proptest::prelude::*;

/// Strategy for scalar values that survive a trip through JSON text unchanged.
fn scalar_strategy() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::Int(n))),
        // Eighths are exact in binary and print without rounding.
        (-1_000_000i32..1_000_000)
            .prop_map(|n| Value::Number(Number::Float(f64::from(n) / 8.0 + 0.125))),
        "\\PC{0,20}".prop_map(Value::String),
        // Milliseconds between roughly 1200 BCE and 14600 CE, covering signed and five-digit years.
        (-100_000_000_000_000i64..400_000_000_000_000).prop_filter_map("timestamp out of range", |millis| {
            DateTime::from_timestamp_millis(millis).map(Value::Timestamp)
        }),
    ]
}

fn value_strategy() -> impl Strategy<Value = Value> {
    scalar_strategy().prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::List),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..6).prop_map(Value::Map),
        ]
    })
}

fn map_strategy() -> impl Strategy<Value = ValueMap> {
    prop::collection::btree_map("[a-zA-Z_][a-zA-Z0-9_]{0,10}", value_strategy(), 0..8)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..ProptestConfig::default()
    })]

    #[test]
    fn decode_inverts_encode(map in map_strategy()) {
        let text = codec::encode(&map);
        let decoded = codec::decode(&text).unwrap();

        prop_assert_eq!(decoded, map);
    }

    #[test]
    fn encoding_is_deterministic(map in map_strategy()) {
        prop_assert_eq!(codec::encode(&map), codec::encode(&map.clone()));
    }
}
