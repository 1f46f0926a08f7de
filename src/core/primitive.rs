//! # Primitive Codec
//!
//! Fixed-width scalars, raw UUIDs and the two variable-length integer forms.
//!
//! ## Wire Format
//! ```text
//! bool            1 byte, 1 = true, 0 = false
//! byte            1 raw byte
//! int16/uint16    2 bytes big-endian
//! int32/uint32    4 bytes big-endian
//! int64/uint64    8 bytes big-endian
//! float32/64      IEEE-754 bits, big-endian
//! uuid            16 raw bytes
//! size            base-128 varint, low group first, 0x80 = continuation
//! nullable-size   [N|C|d5..d0] then size-style bytes; N = null sentinel
//! ```
//!
//! Every reader method fails with the operation name and the offset of the first
//! byte of the value. Writer methods return the number of bytes they emitted.

use crate::core::wire::{WireReader, WireWriter};
use crate::error::{CodecError, Result};
use uuid::Uuid;

pub const TRUE_BYTE: u8 = 1;
pub const FALSE_BYTE: u8 = 0;

/// First byte of an absent nullable-size value
pub const NULL_BYTE: u8 = 0x80;

/// Single byte written for an empty or absent string
pub const EMPTY_BYTE: u8 = 0x00;

pub const SIZEOF_SHORT: usize = 2;
pub const SIZEOF_INT: usize = 4;
pub const SIZEOF_LONG: usize = 8;
pub const SIZEOF_UUID: usize = 16;

const MAX_SHIFT: u32 = 7;
const NULL_SHIFT: u32 = 6;
const NEXT_MASK: u8 = 0x80;
const NULL_NEXT_MASK: u8 = 0x40;
const LSB_MASK: u8 = 0x7F;
const NULL_LSB_MASK: u8 = 0x3F;

/// Longest varint a u64 can need (10 groups of 7 bits)
const MAX_VARINT_LEN: usize = 10;

/// OR `bits` into `acc` at `shift`, refusing to drop set bits past bit 63.
#[inline]
fn accumulate(acc: u64, bits: u8, shift: u32) -> Option<u64> {
    let bits = u64::from(bits);
    if bits == 0 {
        return Some(acc);
    }
    if shift >= u64::BITS || (shift > 0 && bits >> (u64::BITS - shift) != 0) {
        return None;
    }
    Some(acc | (bits << shift))
}

macro_rules! read_be {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $op:literal) => {
        $(#[$doc])*
        pub fn $name(&mut self) -> Result<$ty> {
            let buf = self.read_array::<{ std::mem::size_of::<$ty>() }>($op)?;
            Ok(<$ty>::from_be_bytes(buf))
        }
    };
}

macro_rules! write_be {
    ($(#[$doc:meta])* $name:ident, $ty:ty, $op:literal) => {
        $(#[$doc])*
        pub fn $name(&mut self, value: $ty) -> Result<usize> {
            self.write_all_op($op, &value.to_be_bytes())
        }
    };
}

impl WireReader<'_> {
    /// Read a bool; any byte other than 0 or 1 is a format error
    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.offset();
        match self.read_u8_op("bool")? {
            TRUE_BYTE => Ok(true),
            FALSE_BYTE => Ok(false),
            byte => Err(CodecError::InvalidBool { offset, byte }),
        }
    }

    pub fn read_byte(&mut self) -> Result<u8> {
        self.read_u8_op("byte")
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8_op("byte")? as i8)
    }

    /// Read the explicit type-marker byte of a dynamically typed value
    pub fn read_type(&mut self) -> Result<u8> {
        self.read_u8_op("type")
    }

    read_be!(read_i16, i16, "int16");
    read_be!(read_u16, u16, "uint16");
    read_be!(read_i32, i32, "int32");
    read_be!(read_u32, u32, "uint32");
    read_be!(read_i64, i64, "int64");
    read_be!(read_u64, u64, "uint64");

    pub fn read_f32(&mut self) -> Result<f32> {
        let buf = self.read_array::<SIZEOF_INT>("float32")?;
        Ok(f32::from_bits(u32::from_be_bytes(buf)))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let buf = self.read_array::<SIZEOF_LONG>("float64")?;
        Ok(f64::from_bits(u64::from_be_bytes(buf)))
    }

    /// Read 16 raw bytes as a UUID
    pub fn read_uuid(&mut self) -> Result<Uuid> {
        let buf = self.read_array::<SIZEOF_UUID>("uuid")?;
        Ok(Uuid::from_bytes(buf))
    }

    /// Read a base-128 size varint
    pub fn read_size(&mut self) -> Result<u64> {
        let start = self.offset();
        let mut cur = self.read_u8_op("size")?;
        let mut size = u64::from(cur & LSB_MASK);
        let mut shift = MAX_SHIFT;

        while cur & NEXT_MASK != 0 {
            if shift >= MAX_SHIFT * MAX_VARINT_LEN as u32 {
                return Err(CodecError::VarintOverflow {
                    op: "size",
                    offset: start,
                });
            }
            cur = self.read_u8_op("size")?;
            size = accumulate(size, cur & LSB_MASK, shift).ok_or(CodecError::VarintOverflow {
                op: "size",
                offset: start,
            })?;
            shift += MAX_SHIFT;
        }

        Ok(size)
    }

    /// Read a nullable-size, returning `None` for the null sentinel.
    pub fn read_nullable(&mut self) -> Result<Option<u64>> {
        let start = self.offset();
        let first = self.read_u8_op("nullable-size")?;

        if first & NEXT_MASK != 0 {
            if first & LSB_MASK != 0 {
                return Err(CodecError::NullExpected {
                    op: "nullable-size",
                    offset: start,
                    byte: first,
                });
            }
            return Ok(None);
        }

        let mut size = u64::from(first & NULL_LSB_MASK);
        if first & NULL_NEXT_MASK == 0 {
            return Ok(Some(size));
        }

        let mut shift = NULL_SHIFT;
        loop {
            if shift >= MAX_SHIFT * MAX_VARINT_LEN as u32 {
                return Err(CodecError::VarintOverflow {
                    op: "nullable-size",
                    offset: start,
                });
            }
            let cur = self.read_u8_op("nullable-size")?;
            size = accumulate(size, cur & LSB_MASK, shift).ok_or(CodecError::VarintOverflow {
                op: "nullable-size",
                offset: start,
            })?;
            shift += MAX_SHIFT;
            if cur & NEXT_MASK == 0 {
                return Ok(Some(size));
            }
        }
    }

    /// Read a nullable-size; the null sentinel decodes as 0.
    pub fn read_nullable_size(&mut self) -> Result<u64> {
        Ok(self.read_nullable()?.unwrap_or(0))
    }

    /// Read a size varint used as an element count, enforcing the collection limit
    pub fn read_collection_len(&mut self) -> Result<usize> {
        let offset = self.offset();
        let len = self.read_size()?;
        let limit = self.limits().max_collection_len;
        match usize::try_from(len) {
            Ok(n) if n <= limit => Ok(n),
            _ => Err(CodecError::LengthLimit {
                op: "sequence",
                offset,
                len,
                limit,
            }),
        }
    }
}

impl WireWriter<'_> {
    pub fn write_bool(&mut self, value: bool) -> Result<usize> {
        let byte = if value { TRUE_BYTE } else { FALSE_BYTE };
        self.write_all_op("bool", &[byte])
    }

    pub fn write_byte(&mut self, value: u8) -> Result<usize> {
        self.write_all_op("byte", &[value])
    }

    pub fn write_i8(&mut self, value: i8) -> Result<usize> {
        self.write_all_op("byte", &[value as u8])
    }

    /// Write the explicit type-marker byte of a dynamically typed value
    pub fn write_type(&mut self, value: u8) -> Result<usize> {
        self.write_all_op("type", &[value])
    }

    /// Write the single byte that stands for an empty or absent string
    pub fn write_null(&mut self) -> Result<usize> {
        self.write_all_op("null", &[EMPTY_BYTE])
    }

    write_be!(write_i16, i16, "int16");
    write_be!(write_u16, u16, "uint16");
    write_be!(write_i32, i32, "int32");
    write_be!(write_u32, u32, "uint32");
    write_be!(write_i64, i64, "int64");
    write_be!(write_u64, u64, "uint64");

    pub fn write_f32(&mut self, value: f32) -> Result<usize> {
        self.write_all_op("float32", &value.to_bits().to_be_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<usize> {
        self.write_all_op("float64", &value.to_bits().to_be_bytes())
    }

    pub fn write_uuid(&mut self, value: &Uuid) -> Result<usize> {
        self.write_all_op("uuid", value.as_bytes())
    }

    /// Write a base-128 size varint; zero is the single byte 0x00
    pub fn write_size(&mut self, value: u64) -> Result<usize> {
        let mut buf = [0u8; MAX_VARINT_LEN];
        let mut len = 0;
        let mut rest = value;

        loop {
            let mut byte = (rest & u64::from(LSB_MASK)) as u8;
            rest >>= MAX_SHIFT;
            if rest != 0 {
                byte |= NEXT_MASK;
            }
            buf[len] = byte;
            len += 1;
            if rest == 0 {
                break;
            }
        }

        self.write_all_op("size", &buf[..len])
    }

    /// Write a nullable-size.
    ///
    /// The first byte carries the low seven bits of the value under the 0x40
    /// continuation flag, exactly as deployed peers emit it; readers only take
    /// the low six.
    pub fn write_nullable_size(&mut self, value: u64) -> Result<usize> {
        let mut buf = [0u8; MAX_VARINT_LEN + 1];
        let mut msb = value >> NULL_SHIFT;

        let flag = if msb != 0 { NULL_NEXT_MASK } else { 0 };
        buf[0] = flag | (value & u64::from(LSB_MASK)) as u8;
        let mut len = 1;

        let mut rest = msb;
        while rest > 0 {
            msb >>= MAX_SHIFT;
            let flag = if msb != 0 { NEXT_MASK } else { 0 };
            buf[len] = flag | (rest & u64::from(LSB_MASK)) as u8;
            len += 1;
            rest = msb;
        }

        self.write_all_op("nullable-size", &buf[..len])
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    fn written(f: impl FnOnce(&mut WireWriter<'_>) -> Result<usize>) -> Vec<u8> {
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);
        let n = f(&mut writer).expect("write");
        assert_eq!(n as u64, writer.offset());
        out
    }

    #[test]
    fn test_size_vectors() {
        assert_eq!(written(|w| w.write_size(0)), vec![0x00]);
        assert_eq!(written(|w| w.write_size(127)), vec![0x7F]);
        assert_eq!(written(|w| w.write_size(128)), vec![0x80, 0x01]);
        assert_eq!(written(|w| w.write_size(300)), vec![0xAC, 0x02]);
    }

    #[test]
    fn test_size_roundtrip_edges() {
        for value in [0u64, 1, 127, 128, 16_383, 16_384, u32::MAX as u64, u64::MAX] {
            let bytes = written(|w| w.write_size(value));
            let mut src: &[u8] = &bytes;
            let mut reader = WireReader::new(&mut src);
            assert_eq!(reader.read_size().unwrap(), value);
            assert_eq!(reader.offset(), bytes.len() as u64);
        }
    }

    #[test]
    fn test_nullable_size_vectors() {
        assert_eq!(written(|w| w.write_nullable_size(10)), vec![0x0A]);
        assert_eq!(written(|w| w.write_nullable_size(63)), vec![0x3F]);
        assert_eq!(written(|w| w.write_nullable_size(64)), vec![0x40, 0x01]);
        assert_eq!(written(|w| w.write_nullable_size(100)), vec![0x64, 0x01]);
    }

    #[test]
    fn test_nullable_size_roundtrip_edges() {
        for value in [0u64, 1, 63, 64, 100, 8_191, 8_192, 1 << 40, u64::MAX] {
            let bytes = written(|w| w.write_nullable_size(value));
            let mut src: &[u8] = &bytes;
            let mut reader = WireReader::new(&mut src);
            assert_eq!(reader.read_nullable_size().unwrap(), value, "{value}");
        }
    }

    #[test]
    fn test_nullable_null_sentinel() {
        let bytes = [NULL_BYTE];
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert_eq!(reader.read_nullable().unwrap(), None);

        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert_eq!(reader.read_nullable_size().unwrap(), 0);
    }

    #[test]
    fn test_nullable_bad_sentinel() {
        let bytes = [0x81u8];
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        match reader.read_nullable_size() {
            Err(CodecError::NullExpected { byte, offset, .. }) => {
                assert_eq!(byte, 0x81);
                assert_eq!(offset, 0);
            }
            other => panic!("expected null sentinel error, got {other:?}"),
        }
    }

    #[test]
    fn test_varint_overflow_detected() {
        let bytes = [0xFFu8; 11];
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert!(matches!(
            reader.read_size(),
            Err(CodecError::VarintOverflow { .. })
        ));

        let padded = [0x80u8; 12];
        let mut src: &[u8] = &padded;
        assert!(matches!(
            WireReader::new(&mut src).read_size(),
            Err(CodecError::VarintOverflow { op: "size", offset: 0 })
        ));
    }

    #[test]
    fn test_fixed_width_big_endian() {
        assert_eq!(written(|w| w.write_i16(-2)), vec![0xFF, 0xFE]);
        assert_eq!(written(|w| w.write_u32(0x0102_0304)), vec![1, 2, 3, 4]);
        assert_eq!(
            written(|w| w.write_i64(1)),
            vec![0, 0, 0, 0, 0, 0, 0, 1]
        );
        assert_eq!(
            written(|w| w.write_f32(1.0)),
            1.0f32.to_bits().to_be_bytes().to_vec()
        );
    }

    #[test]
    fn test_float_bit_patterns_survive() {
        let nan = f64::from_bits(0x7FF8_0000_0000_0001);
        let bytes = written(|w| w.write_f64(nan));
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert_eq!(reader.read_f64().unwrap().to_bits(), nan.to_bits());
    }

    #[test]
    fn test_bool_rejects_other_bytes() {
        let bytes = [1u8, 0, 2];
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert!(reader.read_bool().unwrap());
        assert!(!reader.read_bool().unwrap());
        assert!(matches!(
            reader.read_bool(),
            Err(CodecError::InvalidBool { byte: 2, offset: 2 })
        ));
    }

    #[test]
    fn test_uuid_raw_bytes() {
        let id = Uuid::from_bytes([
            0x10, 0x11, 0x12, 0x13, 0x14, 0x15, 0x16, 0x17, 0x18, 0x19, 0x1A, 0x1B, 0x1C, 0x1D,
            0x1E, 0x1F,
        ]);
        let bytes = written(|w| w.write_uuid(&id));
        assert_eq!(bytes.as_slice(), id.as_bytes());

        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src);
        assert_eq!(reader.read_uuid().unwrap(), id);
    }

    #[test]
    fn test_collection_len_limit() {
        let bytes = written(|w| w.write_size(10));
        let mut src: &[u8] = &bytes;
        let mut reader = WireReader::new(&mut src).with_limits(crate::core::wire::ReadLimits {
            max_string_len: 100,
            max_collection_len: 5,
        });
        assert!(matches!(
            reader.read_collection_len(),
            Err(CodecError::LengthLimit { len: 10, limit: 5, .. })
        ));
    }
}
