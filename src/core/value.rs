//! Dynamically typed values carried with an explicit type-marker byte.

use crate::core::wire::{WireReader, WireWriter};
use crate::error::{CodecError, Result};
use uuid::Uuid;

/// Type marker written ahead of a [`Value`] payload.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Bool = 1,
    Byte = 2,
    Short = 3,
    Int = 4,
    Long = 5,
    Float = 6,
    Double = 7,
    Size = 8,
    NullableSize = 9,
    String = 10,
    Uuid = 11,
    Type = 12,
    EndpointId = 13,
}

impl ValueType {
    pub fn from_byte(marker: u8) -> Option<Self> {
        Some(match marker {
            1 => ValueType::Bool,
            2 => ValueType::Byte,
            3 => ValueType::Short,
            4 => ValueType::Int,
            5 => ValueType::Long,
            6 => ValueType::Float,
            7 => ValueType::Double,
            8 => ValueType::Size,
            9 => ValueType::NullableSize,
            10 => ValueType::String,
            11 => ValueType::Uuid,
            12 => ValueType::Type,
            13 => ValueType::EndpointId,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_byte(self) -> u8 {
        self as u8
    }
}

/// A protocol value whose wire type is chosen at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Byte(u8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Size(u64),
    NullableSize(u64),
    String(String),
    Uuid(Uuid),
    Type(u8),
    EndpointId(u64),
}

impl Default for Value {
    fn default() -> Self {
        Value::NullableSize(0)
    }
}

impl Value {
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Byte(_) => ValueType::Byte,
            Value::Short(_) => ValueType::Short,
            Value::Int(_) => ValueType::Int,
            Value::Long(_) => ValueType::Long,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::Size(_) => ValueType::Size,
            Value::NullableSize(_) => ValueType::NullableSize,
            Value::String(_) => ValueType::String,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Type(_) => ValueType::Type,
            Value::EndpointId(_) => ValueType::EndpointId,
        }
    }
}

impl WireReader<'_> {
    /// Read a type marker followed by its payload
    pub fn read_value(&mut self) -> Result<Value> {
        let offset = self.offset();
        let marker = self.read_type()?;
        let value_type =
            ValueType::from_byte(marker).ok_or(CodecError::UnknownValueType { offset, marker })?;

        Ok(match value_type {
            ValueType::Bool => Value::Bool(self.read_bool()?),
            ValueType::Byte => Value::Byte(self.read_byte()?),
            ValueType::Short => Value::Short(self.read_i16()?),
            ValueType::Int => Value::Int(self.read_i32()?),
            ValueType::Long => Value::Long(self.read_i64()?),
            ValueType::Float => Value::Float(self.read_f32()?),
            ValueType::Double => Value::Double(self.read_f64()?),
            ValueType::Size => Value::Size(self.read_size()?),
            ValueType::NullableSize => Value::NullableSize(self.read_nullable_size()?),
            ValueType::String => Value::String(self.read_string()?),
            ValueType::Uuid => Value::Uuid(self.read_uuid()?),
            ValueType::Type => Value::Type(self.read_type()?),
            ValueType::EndpointId => Value::EndpointId(self.read_nullable_size()?),
        })
    }
}

impl WireWriter<'_> {
    /// Write a type marker followed by the value payload
    pub fn write_value(&mut self, value: &Value) -> Result<usize> {
        let marker = self.write_type(value.value_type().as_byte())?;
        let body = match value {
            Value::Bool(v) => self.write_bool(*v)?,
            Value::Byte(v) => self.write_byte(*v)?,
            Value::Short(v) => self.write_i16(*v)?,
            Value::Int(v) => self.write_i32(*v)?,
            Value::Long(v) => self.write_i64(*v)?,
            Value::Float(v) => self.write_f32(*v)?,
            Value::Double(v) => self.write_f64(*v)?,
            Value::Size(v) => self.write_size(*v)?,
            Value::NullableSize(v) | Value::EndpointId(v) => self.write_nullable_size(*v)?,
            Value::String(v) => self.write_string(v)?,
            Value::Uuid(v) => self.write_uuid(v)?,
            Value::Type(v) => self.write_type(*v)?,
        };
        Ok(marker + body)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn roundtrip(value: &Value) -> (Vec<u8>, Value) {
        let mut out = Vec::new();
        let written = WireWriter::new(&mut out).write_value(value).unwrap();
        assert_eq!(written, out.len());
        let mut src: &[u8] = &out;
        let decoded = WireReader::new(&mut src).read_value().unwrap();
        (out, decoded)
    }

    #[test]
    fn test_marker_precedes_payload() {
        let (bytes, decoded) = roundtrip(&Value::Int(258));
        assert_eq!(bytes, vec![4, 0, 0, 1, 2]);
        assert_eq!(decoded, Value::Int(258));

        let (bytes, _) = roundtrip(&Value::String(String::new()));
        assert_eq!(bytes, vec![10, 0]);

        let (bytes, _) = roundtrip(&Value::Size(300));
        assert_eq!(bytes, vec![8, 0xAC, 0x02]);
    }

    #[test]
    fn test_every_marker_is_stable() {
        for marker in 1..=13u8 {
            let value_type = ValueType::from_byte(marker).unwrap();
            assert_eq!(value_type.as_byte(), marker);
        }
        assert!(ValueType::from_byte(0).is_none());
        assert!(ValueType::from_byte(14).is_none());
    }

    #[test]
    fn test_mixed_values_roundtrip() {
        let values = [
            Value::Bool(true),
            Value::Byte(0xFE),
            Value::Short(-2),
            Value::Long(i64::MIN),
            Value::Double(2.5),
            Value::Uuid(Uuid::from_u128(0x1234)),
            Value::Type(7),
            Value::EndpointId(1024),
        ];
        for value in &values {
            assert_eq!(&roundtrip(value).1, value);
        }
    }

    #[test]
    fn test_unknown_marker_is_format_error() {
        let bytes = [0x2Au8, 0x00];
        let mut src: &[u8] = &bytes;
        match WireReader::new(&mut src).read_value() {
            Err(CodecError::UnknownValueType { offset, marker }) => {
                assert_eq!(offset, 0);
                assert_eq!(marker, 0x2A);
            }
            other => panic!("expected unknown marker, got {other:?}"),
        }
    }
}
