//! Self-serialization capability.
//!
//! A type that owns its wire representation implements [`Marshal`] and one of
//! [`Unmarshal`] or [`UnmarshalBytes`], then advertises them to the engine through
//! [`ras_marshal!`](crate::ras_marshal). The engine hands over the raw stream and
//! runs none of its record, sequence or indirection logic for that value; version
//! gating is up to the type.

use crate::core::wire::{WireReader, WireWriter};
use crate::error::Result;
use bytes::Bytes;

pub trait Marshal {
    /// Write `self` for protocol `version`, returning bytes written.
    fn marshal_ras(&self, w: &mut WireWriter<'_>, version: i64) -> Result<usize>;
}

pub trait Unmarshal {
    /// Read `self` from the stream for protocol `version`, returning bytes consumed.
    fn unmarshal_ras(&mut self, r: &mut WireReader<'_>, version: i64) -> Result<usize>;
}

/// Decoding from the whole remaining input at once.
///
/// The buffer holds every byte left in the source; the returned count marks how
/// many belong to this value and the rest stays readable for the next value.
pub trait UnmarshalBytes {
    fn unmarshal_ras_bytes(&mut self, buf: Bytes, version: i64) -> Result<usize>;
}

/// Decode-side capability a value reports to the engine.
pub enum Unmarshaler<'a> {
    Stream(&'a mut dyn Unmarshal),
    Bytes(&'a mut dyn UnmarshalBytes),
}

/// Wire a self-serializing type into the engine.
///
/// `ras_marshal!(T)` uses [`Unmarshal`]; `ras_marshal!(T, bytes)` uses
/// [`UnmarshalBytes`]. Both require [`Marshal`] and `Default`.
#[macro_export]
macro_rules! ras_marshal {
    (@common $ty:ty) => {
        impl $crate::protocol::Encode for $ty {
            fn encode(&self, enc: &mut $crate::protocol::Encoder<'_>) -> $crate::error::Result<()> {
                let version = enc.version();
                $crate::protocol::Marshal::marshal_ras(self, enc.writer(), version).map(|_| ())
            }

            fn marshaler(&self) -> Option<&dyn $crate::protocol::Marshal> {
                Some(self)
            }
        }

        $crate::impl_leaf_slot!($ty);
    };
    ($ty:ty, bytes) => {
        $crate::ras_marshal!(@common $ty);

        impl $crate::protocol::Decode for $ty {
            fn decode(&mut self, dec: &mut $crate::protocol::Decoder<'_>) -> $crate::error::Result<()> {
                let version = dec.version();
                dec.reader()
                    .with_remaining("unmarshal", |buf| {
                        $crate::protocol::UnmarshalBytes::unmarshal_ras_bytes(self, buf, version)
                    })
                    .map(|_| ())
            }

            fn unmarshaler(&mut self) -> Option<$crate::protocol::Unmarshaler<'_>> {
                Some($crate::protocol::Unmarshaler::Bytes(self))
            }
        }
    };
    ($ty:ty) => {
        $crate::ras_marshal!(@common $ty);

        impl $crate::protocol::Decode for $ty {
            fn decode(&mut self, dec: &mut $crate::protocol::Decoder<'_>) -> $crate::error::Result<()> {
                let version = dec.version();
                $crate::protocol::Unmarshal::unmarshal_ras(self, dec.reader(), version).map(|_| ())
            }

            fn unmarshaler(&mut self) -> Option<$crate::protocol::Unmarshaler<'_>> {
                Some($crate::protocol::Unmarshaler::Stream(self))
            }
        }
    };
}
