//! # Generic Encoder
//!
//! Walks a value and writes it to a byte sink.
//!
//! Dispatch per value:
//! - a type advertising [`Marshal`] writes itself and nothing else runs
//! - records write their present fields in ascending wire-number order, through a
//!   registry codec when the field tag names one
//! - sequences write a size prefix and then every element
//! - `Option`/`Box` write their pointee; `None` is an error
//! - scalars go straight to the primitive codec

use crate::config::CodecOptions;
use crate::core::value::Value;
use crate::core::wire::WireWriter;
use crate::error::{CodecError, Result};
use crate::protocol::descriptor;
use crate::protocol::marshal::Marshal;
use crate::protocol::record::Record;
use crate::protocol::registry::CodecRegistry;
use crate::utils::metrics::{global_metrics, Timer};
use chrono::{DateTime, Utc};
use std::io::Write;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// A value the engine can write.
pub trait Encode {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()>;

    /// Self-serialization capability; when present the engine delegates to it entirely.
    fn marshaler(&self) -> Option<&dyn Marshal> {
        None
    }
}

/// Streaming encoder bound to one sink, one protocol version and one registry.
pub struct Encoder<'a> {
    writer: WireWriter<'a>,
    options: CodecOptions,
    registry: &'a CodecRegistry,
    depth: usize,
}

impl<'a> Encoder<'a> {
    /// Encoder with default options at `version`, using the global registry
    pub fn new(sink: &'a mut dyn Write, version: i64) -> Self {
        Self::with_options(sink, CodecOptions::at_version(version))
    }

    pub fn with_options(sink: &'a mut dyn Write, options: CodecOptions) -> Self {
        Self {
            writer: WireWriter::new(sink),
            options,
            registry: CodecRegistry::global(),
            depth: 0,
        }
    }

    /// Resolve override codecs from `registry` instead of the global one
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[inline]
    pub fn version(&self) -> i64 {
        self.options.version
    }

    #[inline]
    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    #[inline]
    pub fn registry(&self) -> &'a CodecRegistry {
        self.registry
    }

    /// Raw sink, for types writing their own representation
    #[inline]
    pub fn writer(&mut self) -> &mut WireWriter<'a> {
        &mut self.writer
    }

    pub fn bytes_written(&self) -> u64 {
        self.writer.offset()
    }

    /// Encode one top-level value, returning the number of bytes written.
    pub fn encode<T: Encode + ?Sized>(&mut self, value: &T) -> Result<usize> {
        let _timer = Timer::start("encode");
        let start = self.writer.offset();

        match self.encode_value(value) {
            Ok(()) => {
                let written = self.writer.offset() - start;
                global_metrics().value_encoded(written);
                debug!(
                    value = std::any::type_name::<T>(),
                    version = self.options.version,
                    bytes = written,
                    "Encoded value"
                );
                Ok(written as usize)
            }
            Err(e) => {
                global_metrics().encode_error();
                warn!(
                    value = std::any::type_name::<T>(),
                    offset = self.writer.offset(),
                    error = %e,
                    "Encode failed"
                );
                Err(e)
            }
        }
    }

    /// Encode a nested value, honoring its self-serialization capability.
    pub fn encode_value<T: Encode + ?Sized>(&mut self, value: &T) -> Result<()> {
        self.enter()?;
        let result = match value.marshaler() {
            Some(marshaler) => {
                global_metrics().marshal_delegated();
                marshaler
                    .marshal_ras(&mut self.writer, self.options.version)
                    .map(|_| ())
            }
            None => value.encode(self),
        };
        self.depth -= 1;
        result
    }

    fn enter(&mut self) -> Result<()> {
        if self.depth >= self.options.max_depth {
            return Err(CodecError::DepthExceeded(self.options.max_depth));
        }
        self.depth += 1;
        Ok(())
    }
}

/// Write the fields of `value` present at the encoder's version.
pub fn encode_record<T: Record>(value: &T, enc: &mut Encoder<'_>) -> Result<()> {
    let descriptors = descriptor::resolve::<T>()?;
    let version = enc.version();

    for field in descriptors.iter() {
        if !field.is_present(version) {
            continue;
        }

        match field.codec.as_deref() {
            Some(name) => {
                let codec = enc.registry().lookup(name)?;
                trace!(
                    record = T::type_name(),
                    field = field.field_index,
                    codec = name,
                    "Encoding field through registry codec"
                );
                let slot = value.field_slot(field.field_index)?;
                codec.encode(enc.writer(), slot)?;
                global_metrics().override_dispatched();
            }
            None => value.encode_field(field.field_index, enc)?,
        }
    }

    Ok(())
}

macro_rules! encode_scalar {
    ($($ty:ty => $write:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                #[inline]
                fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
                    enc.writer().$write(*self).map(|_| ())
                }
            }
        )*
    };
}

encode_scalar!(
    bool => write_bool,
    u8 => write_byte,
    i8 => write_i8,
    i16 => write_i16,
    u16 => write_u16,
    i32 => write_i32,
    u32 => write_u32,
    i64 => write_i64,
    u64 => write_u64,
    f32 => write_f32,
    f64 => write_f64,
);

impl Encode for isize {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        let value = i32::try_from(*self).map_err(|_| CodecError::ValueOutOfRange {
            op: "int32",
            value: *self as i128,
        })?;
        enc.writer().write_i32(value).map(|_| ())
    }
}

impl Encode for usize {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        let value = u32::try_from(*self).map_err(|_| CodecError::ValueOutOfRange {
            op: "uint32",
            value: *self as i128,
        })?;
        enc.writer().write_u32(value).map(|_| ())
    }
}

impl Encode for str {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_string(self).map(|_| ())
    }
}

impl Encode for String {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        self.as_str().encode(enc)
    }
}

impl Encode for Uuid {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_uuid(self).map(|_| ())
    }
}

/// Sixteen raw bytes, the same wire form as a UUID
impl Encode for [u8; 16] {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_all_op("uuid", self).map(|_| ())
    }
}

impl Encode for DateTime<Utc> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_time(self).map(|_| ())
    }
}

impl Encode for Value {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_value(self).map(|_| ())
    }
}

impl<T: Encode> Encode for [T] {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.writer().write_size(self.len() as u64)?;
        for item in self {
            enc.encode_value(item)?;
        }
        Ok(())
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        self.as_slice().encode(enc)
    }
}

impl<T: Encode> Encode for Option<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        match self {
            Some(inner) => enc.encode_value(inner),
            None => Err(CodecError::MissingValue(std::any::type_name::<Self>())),
        }
    }
}

impl<T: Encode + ?Sized> Encode for Box<T> {
    fn encode(&self, enc: &mut Encoder<'_>) -> Result<()> {
        enc.encode_value(&**self)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    fn to_bytes<T: Encode + ?Sized>(value: &T) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        Encoder::new(&mut out, 0).encode(value)?;
        Ok(out)
    }

    #[test]
    fn test_scalars_are_big_endian() {
        assert_eq!(to_bytes(&0x0102i16).unwrap(), vec![1, 2]);
        assert_eq!(to_bytes(&7usize).unwrap(), vec![0, 0, 0, 7]);
        assert_eq!(to_bytes(&true).unwrap(), vec![1]);
        assert_eq!(to_bytes("").unwrap(), vec![0]);
    }

    #[test]
    fn test_sequence_prefix() {
        assert_eq!(to_bytes(&Vec::<i32>::new()).unwrap(), vec![0]);
        assert_eq!(
            to_bytes(&vec![1u16, 2]).unwrap(),
            vec![2, 0, 1, 0, 2]
        );
    }

    #[test]
    fn test_unset_indirection_is_error() {
        let value: Option<Box<i32>> = None;
        assert!(matches!(
            to_bytes(&value),
            Err(CodecError::MissingValue(_))
        ));
        assert_eq!(to_bytes(&Some(Box::new(3i32))).unwrap(), vec![0, 0, 0, 3]);
    }

    #[test]
    fn test_usize_out_of_range() {
        if usize::BITS > 32 {
            let value = u32::MAX as usize + 1;
            assert!(matches!(
                to_bytes(&value),
                Err(CodecError::ValueOutOfRange { .. })
            ));
        }
    }

    #[test]
    fn test_depth_limit() {
        let nested: Vec<Vec<Vec<u8>>> = vec![vec![vec![1]]];
        let mut out = Vec::new();
        let options = CodecOptions::default().with_max_depth(3);
        assert!(matches!(
            Encoder::with_options(&mut out, options).encode(&nested),
            Err(CodecError::DepthExceeded(3))
        ));

        let mut out = Vec::new();
        let options = CodecOptions::default().with_max_depth(4);
        Encoder::with_options(&mut out, options).encode(&nested).unwrap();
        assert_eq!(out, vec![1, 1, 1, 1]);
    }
}
