//! Built-in registry codecs.
//!
//! One wire form per codec, several accepted field types each: integer codecs
//! take any integer field and truncate to the wire width, `float`/`double` take
//! either float, `uuid` and `time` take their natural type plus the common raw
//! representations.

use crate::core::wire::{WireReader, WireWriter};
use crate::error::{CodecError, Result};
use crate::protocol::record::{SlotMut, SlotRef};
use crate::protocol::registry::Codec;
use chrono::{DateTime, Utc};
use uuid::Uuid;

type WriteInt = fn(&mut WireWriter<'_>, i128) -> Result<usize>;
type ReadInt = fn(&mut WireReader<'_>) -> Result<i128>;

fn unsupported(codec: &str, target: &'static str) -> CodecError {
    CodecError::UnsupportedTarget {
        codec: codec.to_string(),
        target,
    }
}

#[inline]
fn consumed(r: &WireReader<'_>, start: u64) -> usize {
    (r.offset() - start) as usize
}

fn int_from_slot(codec: &str, slot: &SlotRef<'_>) -> Result<i128> {
    macro_rules! probe {
        ($($ty:ty),*) => {
            $(
                if let Some(v) = slot.downcast::<$ty>() {
                    return Ok(*v as i128);
                }
            )*
        };
    }
    probe!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);
    Err(unsupported(codec, slot.type_name()))
}

fn int_into_slot(codec: &str, mut slot: SlotMut<'_>, value: i128) -> Result<()> {
    macro_rules! assign {
        ($($ty:ty),*) => {
            $(
                if let Some(target) = slot.downcast_mut::<$ty>() {
                    *target = value as $ty;
                    return Ok(());
                }
            )*
        };
    }
    assign!(i8, u8, i16, u16, i32, u32, i64, u64, isize, usize);
    Err(unsupported(codec, slot.type_name()))
}

fn int_codec(name: &'static str, write: WriteInt, read: ReadInt) -> Codec {
    Codec::new(
        name,
        move |w, slot| write(w, int_from_slot(name, &slot)?),
        move |r, slot| {
            let start = r.offset();
            let value = read(r)?;
            int_into_slot(name, slot, value)?;
            Ok(consumed(r, start))
        },
    )
}

fn bool_codec() -> Codec {
    Codec::new(
        "bool",
        |w, slot| match slot.downcast::<bool>() {
            Some(v) => w.write_bool(*v),
            None => w.write_bool(int_from_slot("bool", &slot)? != 0),
        },
        |r, mut slot| {
            let value = r.read_bool()?;
            match slot.downcast_mut::<bool>() {
                Some(target) => *target = value,
                None => int_into_slot("bool", slot, i128::from(value))?,
            }
            Ok(1)
        },
    )
}

fn float_codec(name: &'static str, wide: bool) -> Codec {
    Codec::new(
        name,
        move |w, slot| {
            let value = if let Some(v) = slot.downcast::<f64>() {
                *v
            } else if let Some(v) = slot.downcast::<f32>() {
                f64::from(*v)
            } else {
                return Err(unsupported(name, slot.type_name()));
            };
            if wide {
                w.write_f64(value)
            } else {
                w.write_f32(value as f32)
            }
        },
        move |r, mut slot| {
            let start = r.offset();
            let value = if wide {
                r.read_f64()?
            } else {
                f64::from(r.read_f32()?)
            };
            if let Some(target) = slot.downcast_mut::<f64>() {
                *target = value;
            } else if let Some(target) = slot.downcast_mut::<f32>() {
                *target = value as f32;
            } else {
                return Err(unsupported(name, slot.type_name()));
            }
            Ok(consumed(r, start))
        },
    )
}

fn string_codec() -> Codec {
    Codec::new(
        "string",
        |w, slot| {
            if let Some(v) = slot.downcast::<String>() {
                w.write_string(v)
            } else if let Some(v) = slot.downcast::<Vec<u8>>() {
                w.write_string_bytes(v)
            } else {
                Err(unsupported("string", slot.type_name()))
            }
        },
        |r, mut slot| {
            let start = r.offset();
            if let Some(target) = slot.downcast_mut::<String>() {
                *target = r.read_string()?;
            } else if let Some(target) = slot.downcast_mut::<Vec<u8>>() {
                *target = r.read_string_bytes()?;
            } else {
                return Err(unsupported("string", slot.type_name()));
            }
            Ok(consumed(r, start))
        },
    )
}

fn uuid_from_slot(slot: &SlotRef<'_>) -> Result<Uuid> {
    if let Some(v) = slot.downcast::<Uuid>() {
        Ok(*v)
    } else if let Some(v) = slot.downcast::<[u8; 16]>() {
        Ok(Uuid::from_bytes(*v))
    } else if let Some(v) = slot.downcast::<Vec<u8>>() {
        Uuid::from_slice(v).map_err(|e| CodecError::InvalidUuid(e.to_string()))
    } else if let Some(v) = slot.downcast::<String>() {
        Uuid::parse_str(v).map_err(|e| CodecError::InvalidUuid(format!("{v:?}: {e}")))
    } else {
        Err(unsupported("uuid", slot.type_name()))
    }
}

fn uuid_codec() -> Codec {
    Codec::new(
        "uuid",
        |w, slot| {
            let value = uuid_from_slot(&slot)?;
            w.write_uuid(&value)
        },
        |r, mut slot| {
            let start = r.offset();
            let value = r.read_uuid()?;
            if let Some(target) = slot.downcast_mut::<Uuid>() {
                *target = value;
            } else if let Some(target) = slot.downcast_mut::<[u8; 16]>() {
                *target = value.into_bytes();
            } else if let Some(target) = slot.downcast_mut::<Vec<u8>>() {
                *target = value.as_bytes().to_vec();
            } else if let Some(target) = slot.downcast_mut::<String>() {
                *target = value.hyphenated().to_string();
            } else {
                return Err(unsupported("uuid", slot.type_name()));
            }
            Ok(consumed(r, start))
        },
    )
}

fn time_codec() -> Codec {
    Codec::new(
        "time",
        |w, slot| {
            if let Some(v) = slot.downcast::<DateTime<Utc>>() {
                w.write_time(v)
            } else if let Some(v) = slot.downcast::<i64>() {
                w.write_time_millis(*v)
            } else if let Some(v) = slot.downcast::<u64>() {
                let millis = i64::try_from(*v).map_err(|_| CodecError::ValueOutOfRange {
                    op: "time",
                    value: i128::from(*v),
                })?;
                w.write_time_millis(millis)
            } else {
                Err(unsupported("time", slot.type_name()))
            }
        },
        |r, mut slot| {
            let start = r.offset();
            if let Some(target) = slot.downcast_mut::<DateTime<Utc>>() {
                *target = r.read_time()?;
            } else if let Some(target) = slot.downcast_mut::<i64>() {
                *target = r.read_time_millis()?;
            } else if let Some(target) = slot.downcast_mut::<u64>() {
                let millis = r.read_time_millis()?;
                *target = u64::try_from(millis).map_err(|_| CodecError::ValueOutOfRange {
                    op: "time",
                    value: i128::from(millis),
                })?;
            } else {
                return Err(unsupported("time", slot.type_name()));
            }
            Ok(consumed(r, start))
        },
    )
}

/// Every built-in codec with its whitespace-separated names; the first name is canonical.
pub(crate) fn all() -> Vec<(&'static str, Codec)> {
    vec![
        ("bool", bool_codec()),
        (
            "byte",
            int_codec(
                "byte",
                |w, v| w.write_byte(v as u8),
                |r| r.read_byte().map(i128::from),
            ),
        ),
        (
            "type",
            int_codec(
                "type",
                |w, v| w.write_type(v as u8),
                |r| r.read_type().map(i128::from),
            ),
        ),
        (
            "short char int16 uint16",
            int_codec(
                "short",
                |w, v| w.write_i16(v as i16),
                |r| r.read_i16().map(i128::from),
            ),
        ),
        (
            "int int32 uint32",
            int_codec(
                "int",
                |w, v| w.write_i32(v as i32),
                |r| r.read_i32().map(i128::from),
            ),
        ),
        (
            "long int64 uint64",
            int_codec(
                "long",
                |w, v| w.write_i64(v as i64),
                |r| r.read_i64().map(i128::from),
            ),
        ),
        ("float float32", float_codec("float", false)),
        ("double float64", float_codec("double", true)),
        ("string", string_codec()),
        (
            "null-size nullable-size",
            int_codec(
                "null-size",
                |w, v| w.write_nullable_size(v as u64),
                |r| r.read_nullable_size().map(i128::from),
            ),
        ),
        (
            "size",
            int_codec(
                "size",
                |w, v| w.write_size(v as u64),
                |r| r.read_size().map(i128::from),
            ),
        ),
        ("uuid", uuid_codec()),
        ("time", time_codec()),
    ]
}
