//! # ras-codec
//!
//! Binary codec for the RAS remote administration wire format, plus a
//! schema-driven engine that encodes and decodes whole records field by field.
//!
//! ## Layers
//! - [`core`]: stateless primitives (big-endian scalars, UUIDs, size and
//!   nullable-size varints, strings, epoch-tick times, typed values)
//! - [`protocol`]: records declared with [`ras_record!`], the override codec
//!   registry, the self-serialization escape hatch, and the generic encoder/decoder
//! - [`config`], [`error`], [`utils`]: configuration, errors, logging and metrics
//!
//! ## Example
//! ```rust
//! use ras_codec::ras_record;
//! use uuid::Uuid;
//!
//! ras_record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct Session {
//!         #[ras(",1")]
//!         pub uuid: Uuid,
//!         #[ras("string,2")]
//!         pub host: String,
//!         #[ras(",3,10")]
//!         pub db_proc_took: i32,
//!     }
//! }
//!
//! let session = Session {
//!     uuid: Uuid::from_u128(1),
//!     host: "srv".into(),
//!     db_proc_took: 12,
//! };
//!
//! let bytes = ras_codec::encode(&session, 10).unwrap();
//! let decoded: Session = ras_codec::decode(&bytes, 10).unwrap();
//! assert_eq!(decoded, session);
//!
//! // At version 9 the third field is not on the wire.
//! let older = ras_codec::encode(&session, 9).unwrap();
//! assert_eq!(older.len(), bytes.len() - 4);
//! ```
//!
//! ## Concurrency
//! Calls are synchronous and share nothing but the codec registry and the
//! descriptor cache. Register custom codecs before concurrent traffic starts.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::config::{CodecConfig, CodecOptions};
pub use crate::core::value::{Value, ValueType};
pub use crate::error::{CodecError, ErrorKind, Result};
pub use crate::protocol::{
    Codec, CodecRegistry, Decode, Decoder, Encode, Encoder, Marshal, Record, Unmarshal,
    UnmarshalBytes,
};

use bytes::Bytes;
use std::io::{Read, Write};

/// Encode `value` at protocol `version` into a new buffer.
pub fn encode<T: Encode + ?Sized>(value: &T, version: i64) -> Result<Bytes> {
    let mut out = Vec::new();
    Encoder::new(&mut out, version).encode(value)?;
    Ok(Bytes::from(out))
}

/// Encode `value` at protocol `version` straight into `sink`, returning bytes written.
pub fn encode_to<T: Encode + ?Sized>(sink: &mut dyn Write, value: &T, version: i64) -> Result<usize> {
    Encoder::new(sink, version).encode(value)
}

/// Decode a `T` from the start of `bytes`; trailing bytes are left unread.
pub fn decode<T: Decode + Default>(bytes: &[u8], version: i64) -> Result<T> {
    let mut src = bytes;
    let mut decoder = Decoder::new(&mut src, version);
    decoder.decode()
}

/// Decode a `T` from `source`, reading only the bytes that belong to it.
///
/// Types that decode from the whole remaining buffer drain `source` to EOF and
/// the unconsumed tail is dropped. To keep it, decode through a [`Decoder`] and
/// call [`Decoder::into_remaining`].
pub fn decode_from<T: Decode + Default>(source: &mut dyn Read, version: i64) -> Result<T> {
    Decoder::new(source, version).decode()
}

/// Decode into an existing value, returning bytes consumed.
///
/// On error `target` is left partially written.
pub fn decode_into<T: Decode + ?Sized>(target: &mut T, bytes: &[u8], version: i64) -> Result<usize> {
    let mut src = bytes;
    let mut decoder = Decoder::new(&mut src, version);
    decoder.decode_into(target)
}
