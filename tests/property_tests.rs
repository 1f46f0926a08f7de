//! Property-based tests using proptest
//!
//! These tests check codec invariants across randomly generated values and
//! arbitrary input bytes.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{DateTime, Utc};
use proptest::prelude::*;
use ras_codec::core::wire::{WireReader, WireWriter};
use ras_codec::core::{ticks_from_unix_millis, unix_millis_from_ticks};
use ras_codec::{decode, encode, ras_record, Value};
use uuid::Uuid;

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Entry {
        #[ras(",1")]
        id: Uuid,
        #[ras(",2")]
        weight: i32,
        #[ras(",3")]
        name: String,
    }
}

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Batch {
        #[ras(",1")]
        owner: Uuid,
        #[ras("int,2,3")]
        limit: i64,
        #[ras(",3")]
        entries: Vec<Entry>,
        #[ras(",4,5")]
        tags: Vec<String>,
    }
}

fn entry_strategy() -> impl Strategy<Value = Entry> {
    (any::<u128>(), any::<i32>(), ".{0,40}").prop_map(|(id, weight, name)| Entry {
        id: Uuid::from_u128(id),
        weight,
        name,
    })
}

fn batch_strategy() -> impl Strategy<Value = Batch> {
    (
        any::<u128>(),
        any::<i32>(),
        prop::collection::vec(entry_strategy(), 0..20),
        prop::collection::vec(".{0,10}", 0..5),
    )
        .prop_map(|(owner, limit, entries, tags)| Batch {
            owner: Uuid::from_u128(owner),
            limit: i64::from(limit),
            entries,
            tags,
        })
}

// Property: records survive a round trip at any version
proptest! {
    #[test]
    fn prop_record_roundtrip(batch in batch_strategy(), version in 0i64..8) {
        let bytes = encode(&batch, version).expect("encode");
        let decoded: Batch = decode(&bytes, version).expect("decode");

        let mut expected = batch.clone();
        if version < 3 {
            expected.limit = 0;
        }
        if version < 5 {
            expected.tags.clear();
        }
        prop_assert_eq!(decoded, expected);
    }
}

// Property: a newer version never writes fewer bytes than an older one
proptest! {
    #[test]
    fn prop_version_gating_only_adds(batch in batch_strategy(), low in 0i64..6, step in 0i64..4) {
        let older = encode(&batch, low).expect("encode");
        let newer = encode(&batch, low + step).expect("encode");
        prop_assert!(newer.len() >= older.len());
    }
}

// Property: size varints use ceil(bits / 7) bytes and decode back
proptest! {
    #[test]
    fn prop_size_varint_length(value in any::<u64>()) {
        let mut out = Vec::new();
        let written = WireWriter::new(&mut out).write_size(value).unwrap();
        prop_assert_eq!(written, out.len());

        let bits = 64 - value.leading_zeros() as usize;
        prop_assert_eq!(out.len(), bits.max(1).div_ceil(7));

        let mut src: &[u8] = &out;
        prop_assert_eq!(WireReader::new(&mut src).read_size().unwrap(), value);
        prop_assert!(src.is_empty());
    }
}

// Property: nullable sizes never start with the null flag and decode back
proptest! {
    #[test]
    fn prop_nullable_size_roundtrip(value in any::<u64>()) {
        let mut out = Vec::new();
        WireWriter::new(&mut out).write_nullable_size(value).unwrap();
        prop_assert_eq!(out[0] & 0x80, 0);

        let mut src: &[u8] = &out;
        prop_assert_eq!(WireReader::new(&mut src).read_nullable_size().unwrap(), value);
        prop_assert!(src.is_empty());
    }
}

// Property: any UTF-8 string round-trips
proptest! {
    #[test]
    fn prop_string_roundtrip(text in ".*") {
        let bytes = encode(text.as_str(), 0).unwrap();
        if text.is_empty() {
            prop_assert_eq!(&bytes[..], &[0u8][..]);
        }
        prop_assert_eq!(decode::<String>(&bytes, 0).unwrap(), text);
    }
}

// Property: float bit patterns are carried exactly, NaN payloads included
proptest! {
    #[test]
    fn prop_float_bits_preserved(bits32 in any::<u32>(), bits64 in any::<u64>()) {
        let single = f32::from_bits(bits32);
        let decoded: f32 = decode(&encode(&single, 0).unwrap(), 0).unwrap();
        prop_assert_eq!(decoded.to_bits(), bits32);

        let double = f64::from_bits(bits64);
        let decoded: f64 = decode(&encode(&double, 0).unwrap(), 0).unwrap();
        prop_assert_eq!(decoded.to_bits(), bits64);
    }
}

// Property: millisecond times round-trip through ticks
proptest! {
    #[test]
    fn prop_time_roundtrip(millis in -62_135_596_800_000i64..253_402_300_799_999) {
        let ticks = ticks_from_unix_millis(millis).unwrap();
        prop_assert_eq!(unix_millis_from_ticks(ticks), millis);

        let time = DateTime::<Utc>::from_timestamp_millis(millis).unwrap();
        let decoded: DateTime<Utc> = decode(&encode(&time, 0).unwrap(), 0).unwrap();
        prop_assert_eq!(decoded, time);
    }
}

// Property: typed values keep their variant
proptest! {
    #[test]
    fn prop_value_roundtrip(n in any::<i64>(), s in ".{0,20}", id in any::<u128>(), b in any::<u8>()) {
        for value in [
            Value::Long(n),
            Value::Int(n as i32),
            Value::Size(n.unsigned_abs()),
            Value::NullableSize(n.unsigned_abs()),
            Value::String(s.clone()),
            Value::Uuid(Uuid::from_u128(id)),
            Value::Type(b),
            Value::EndpointId(n.unsigned_abs()),
        ] {
            let decoded: Value = decode(&encode(&value, 0).unwrap(), 0).unwrap();
            prop_assert_eq!(decoded, value);
        }
    }
}

// Property: arbitrary input never panics the decoder
proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(data in prop::collection::vec(any::<u8>(), 0..512)) {
        let _ = decode::<Batch>(&data, 10);
        let _ = decode::<Value>(&data, 0);
        let _ = decode::<Vec<String>>(&data, 0);
    }
}
