//! Codec registry behavior seen from outside the crate

#![allow(clippy::unwrap_used, clippy::expect_used)]

use ras_codec::protocol::{Decoder, Encoder};
use ras_codec::{decode, encode, ras_record, CodecError, CodecRegistry};
use std::sync::Arc;
use std::thread;

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Port {
        #[ras("port16,1")]
        value: u32,
        #[ras("byte,2")]
        flags: i64,
    }
}

ras_record! {
    #[derive(Debug, Default, Clone, PartialEq)]
    struct Reversed {
        #[ras("reversed-string,1")]
        text: String,
    }
}

fn register_port16(registry: &CodecRegistry) {
    registry
        .register(
            "port16 PORT",
            |w, slot| {
                let port = slot
                    .downcast::<u32>()
                    .copied()
                    .ok_or(CodecError::Custom("port16 expects u32".into()))?;
                let port = u16::try_from(port).map_err(|_| CodecError::ValueOutOfRange {
                    op: "port16",
                    value: i128::from(port),
                })?;
                w.write_u16(port)
            },
            |r, mut slot| {
                let port = r.read_u16()?;
                if let Some(target) = slot.downcast_mut::<u32>() {
                    *target = u32::from(port);
                }
                Ok(2)
            },
        )
        .unwrap();
}

#[test]
fn test_global_registration_is_visible_to_records() {
    register_port16(CodecRegistry::global());

    let value = Port {
        value: 1541,
        flags: 3,
    };
    let bytes = encode(&value, 0).unwrap();
    assert_eq!(&bytes[..], &[0x06, 0x05, 0x03]);
    assert_eq!(decode::<Port>(&bytes, 0).unwrap(), value);

    let err = encode(&Port { value: 70_000, flags: 0 }, 0).unwrap_err();
    assert!(matches!(err, CodecError::ValueOutOfRange { op: "port16", .. }));
}

#[test]
fn test_private_registry_does_not_leak() {
    let registry = CodecRegistry::with_builtins();
    registry
        .register(
            "reversed-string",
            |w, slot| {
                let text: String = slot
                    .downcast::<String>()
                    .map(|s| s.chars().rev().collect())
                    .unwrap_or_default();
                w.write_string(&text)
            },
            |r, mut slot| {
                let start = r.offset();
                let text = r.read_string()?;
                if let Some(target) = slot.downcast_mut::<String>() {
                    *target = text.chars().rev().collect();
                }
                Ok((r.offset() - start) as usize)
            },
        )
        .unwrap();

    let value = Reversed { text: "abc".into() };

    let mut out = Vec::new();
    Encoder::new(&mut out, 0)
        .with_registry(&registry)
        .encode(&value)
        .unwrap();
    assert_eq!(out, vec![3, b'c', b'b', b'a']);

    let mut src: &[u8] = &out;
    let mut decoder = Decoder::new(&mut src, 0).with_registry(&registry);
    let decoded: Reversed = decoder.decode().unwrap();
    assert_eq!(decoded, value);

    assert!(!CodecRegistry::global().contains("reversed-string"));
    assert!(matches!(
        encode(&value, 0),
        Err(CodecError::UnknownCodec(name)) if name == "reversed-string"
    ));
}

#[test]
fn test_concurrent_lookups_after_warmup() {
    let registry = Arc::new(CodecRegistry::with_builtins());
    register_port16(&registry);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                for _ in 0..200 {
                    let name = if i % 2 == 0 { "PORT" } else { "int32" };
                    let codec = registry.lookup(name).unwrap();
                    assert!(!codec.name().is_empty());
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_builtin_names_listed() {
    let names = CodecRegistry::with_builtins().names();
    for expected in [
        "bool", "byte", "char", "double", "float", "int", "long", "null-size", "short",
        "size", "string", "time", "type", "uuid",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
}
