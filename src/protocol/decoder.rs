//! # Generic Decoder
//!
//! Reads values from a byte source into caller-owned destinations.
//!
//! Sequences are rebuilt from scratch on every decode and indirections always
//! receive a fresh default pointee, so nothing from a previous value leaks into
//! the result. On error the destination is partially written and must be
//! discarded.

use crate::config::CodecOptions;
use crate::core::value::Value;
use crate::core::wire::WireReader;
use crate::error::{CodecError, Result};
use crate::protocol::descriptor;
use crate::protocol::marshal::Unmarshaler;
use crate::protocol::record::Record;
use crate::protocol::registry::CodecRegistry;
use crate::utils::metrics::{global_metrics, Timer};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use std::io::Read;
use tracing::{debug, trace, warn};
use uuid::Uuid;

/// Upper bound on capacity reserved up front for a decoded sequence
const PREALLOC_LIMIT: usize = 4096;

/// A value the engine can read in place.
pub trait Decode {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()>;

    /// Self-deserialization capability; when present the engine delegates to it entirely.
    fn unmarshaler(&mut self) -> Option<Unmarshaler<'_>> {
        None
    }
}

/// Streaming decoder bound to one source, one protocol version and one registry.
pub struct Decoder<'a> {
    reader: WireReader<'a>,
    options: CodecOptions,
    registry: &'a CodecRegistry,
    depth: usize,
}

impl<'a> Decoder<'a> {
    /// Decoder with default options at `version`, using the global registry
    pub fn new(source: &'a mut dyn Read, version: i64) -> Self {
        Self::with_options(source, CodecOptions::at_version(version))
    }

    pub fn with_options(source: &'a mut dyn Read, options: CodecOptions) -> Self {
        Self {
            reader: WireReader::new(source).with_limits(options.read_limits()),
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

    /// Raw source, for types reading their own representation
    #[inline]
    pub fn reader(&mut self) -> &mut WireReader<'a> {
        &mut self.reader
    }

    pub fn bytes_read(&self) -> u64 {
        self.reader.offset()
    }

    /// Finish decoding, returning bytes pulled from the source but not consumed.
    ///
    /// Non-empty only after a whole-buffer type drained the source.
    pub fn into_remaining(self) -> Bytes {
        self.reader.into_pending()
    }

    /// Decode a fresh `T` from the source.
    pub fn decode<T: Decode + Default>(&mut self) -> Result<T> {
        let mut value = T::default();
        self.decode_into(&mut value)?;
        Ok(value)
    }

    /// Decode one top-level value in place, returning the number of bytes consumed.
    pub fn decode_into<T: Decode + ?Sized>(&mut self, target: &mut T) -> Result<usize> {
        let _timer = Timer::start("decode");
        let start = self.reader.offset();

        match self.decode_value(target) {
            Ok(()) => {
                let consumed = self.reader.offset() - start;
                global_metrics().value_decoded(consumed);
                debug!(
                    value = std::any::type_name::<T>(),
                    version = self.options.version,
                    bytes = consumed,
                    "Decoded value"
                );
                Ok(consumed as usize)
            }
            Err(e) => {
                global_metrics().decode_error();
                warn!(
                    value = std::any::type_name::<T>(),
                    offset = self.reader.offset(),
                    error = %e,
                    "Decode failed"
                );
                Err(e)
            }
        }
    }

    /// Decode a nested value, honoring its self-deserialization capability.
    pub fn decode_value<T: Decode + ?Sized>(&mut self, value: &mut T) -> Result<()> {
        self.enter()?;
        let version = self.options.version;
        let result = match value.unmarshaler() {
            Some(Unmarshaler::Stream(unmarshal)) => {
                global_metrics().marshal_delegated();
                unmarshal
                    .unmarshal_ras(&mut self.reader, version)
                    .map(|_| ())
            }
            Some(Unmarshaler::Bytes(unmarshal)) => {
                global_metrics().marshal_delegated();
                self.reader
                    .with_remaining("unmarshal", |buf| {
                        unmarshal.unmarshal_ras_bytes(buf, version)
                    })
                    .map(|_| ())
            }
            None => value.decode(self),
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

/// Read the fields of `value` present at the decoder's version.
///
/// Fields gated out by version or ignored keep whatever value they had.
pub fn decode_record<T: Record>(value: &mut T, dec: &mut Decoder<'_>) -> Result<()> {
    let descriptors = descriptor::resolve::<T>()?;
    let version = dec.version();

    for field in descriptors.iter() {
        if !field.is_present(version) {
            continue;
        }

        match field.codec.as_deref() {
            Some(name) => {
                let codec = dec.registry().lookup(name)?;
                trace!(
                    record = T::type_name(),
                    field = field.field_index,
                    codec = name,
                    "Decoding field through registry codec"
                );
                let slot = value.field_slot_mut(field.field_index)?;
                codec.decode(dec.reader(), slot)?;
                global_metrics().override_dispatched();
            }
            None => value.decode_field(field.field_index, dec)?,
        }
    }

    Ok(())
}

macro_rules! decode_scalar {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                #[inline]
                fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
                    *self = dec.reader().$read()?;
                    Ok(())
                }
            }
        )*
    };
}

decode_scalar!(
    bool => read_bool,
    u8 => read_byte,
    i8 => read_i8,
    i16 => read_i16,
    u16 => read_u16,
    i32 => read_i32,
    u32 => read_u32,
    i64 => read_i64,
    u64 => read_u64,
    f32 => read_f32,
    f64 => read_f64,
    String => read_string,
    Uuid => read_uuid,
    DateTime<Utc> => read_time,
    Value => read_value,
);

impl Decode for isize {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let value = dec.reader().read_i32()?;
        *self = isize::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
            op: "int32",
            value: i128::from(value),
        })?;
        Ok(())
    }
}

impl Decode for usize {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let value = dec.reader().read_u32()?;
        *self = usize::try_from(value).map_err(|_| CodecError::ValueOutOfRange {
            op: "uint32",
            value: i128::from(value),
        })?;
        Ok(())
    }
}

impl Decode for [u8; 16] {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        *self = dec.reader().read_array::<16>("uuid")?;
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Vec<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let len = dec.reader().read_collection_len()?;
        let mut items = Vec::with_capacity(len.min(PREALLOC_LIMIT));
        for _ in 0..len {
            let mut item = T::default();
            dec.decode_value(&mut item)?;
            items.push(item);
        }
        *self = items;
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Option<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let mut fresh = T::default();
        dec.decode_value(&mut fresh)?;
        *self = Some(fresh);
        Ok(())
    }
}

impl<T: Decode + Default> Decode for Box<T> {
    fn decode(&mut self, dec: &mut Decoder<'_>) -> Result<()> {
        let mut fresh = Box::<T>::default();
        dec.decode_value(&mut *fresh)?;
        *self = fresh;
        Ok(())
    }
}
