//! # Error Types
//!
//! Error handling for every encode and decode operation in the codec.
//!
//! This module defines all error variants that can occur while reading or writing
//! the wire format, from a truncated byte source up to a record type whose field
//! metadata cannot be resolved.
//!
//! ## Error Categories
//! - **I/O Errors**: the byte source ran dry or the sink refused a write
//! - **Format Errors**: bytes that are not valid wire data (bad null sentinel, bad bool,
//!   unknown type marker, invalid UTF-8, oversized lengths)
//! - **Schema Errors**: unknown override codecs, malformed field tags
//! - **Type Errors**: override codecs applied to unsupported field types, nesting too deep
//! - **Invalid Calls**: a required value is absent
//!
//! Every error aborts the current call. Stream errors carry the operation name and the
//! byte offset at which they happened; a destination decoded in place must be discarded.
//!
//! ## Example Usage
//! ```rust
//! use ras_codec::error::{CodecError, ErrorKind, Result};
//!
//! fn first_string(bytes: &[u8]) -> Result<String> {
//!     ras_codec::decode::<String>(bytes, 0)
//! }
//!
//! match first_string(&[0x05, b'a']) {
//!     Err(e) => assert_eq!(e.kind(), ErrorKind::Io),
//!     Ok(_) => unreachable!(),
//! }
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Registry lock errors
    pub const ERR_REGISTRY_WRITE_LOCK: &str = "Failed to acquire write lock on codec registry";
    pub const ERR_REGISTRY_READ_LOCK: &str = "Failed to acquire read lock on codec registry";

    /// Descriptor cache lock errors
    pub const ERR_DESCRIPTOR_CACHE_LOCK: &str = "Failed to acquire lock on descriptor cache";

    /// Field tag errors
    pub const ERR_TAG_TOO_MANY_PARTS: &str = "too many values in tag";
    pub const ERR_TAG_BAD_NUMBER: &str = "wire number is not an integer";
    pub const ERR_TAG_BAD_VERSION: &str = "minimum version is not an integer";

    /// Registration errors
    pub const ERR_EMPTY_CODEC_NAME: &str = "codec name list is empty";
}

/// Coarse classification of a [`CodecError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The byte source or sink failed, including truncation.
    Io,
    /// The bytes violate the wire format.
    Format,
    /// Field metadata or codec names could not be resolved.
    Schema,
    /// A value's type cannot be handled where it was found.
    Type,
    /// The caller asked for something that cannot be done.
    InvalidCall,
    /// Configuration could not be loaded or failed validation.
    Config,
}

// CodecError is the error type for all codec operations
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("{op}: I/O error at byte {offset}: {source}")]
    Io {
        op: &'static str,
        offset: u64,
        #[source]
        source: io::Error,
    },

    #[error("{op}: null expected at byte {offset}, found {byte:#04x}")]
    NullExpected {
        op: &'static str,
        offset: u64,
        byte: u8,
    },

    #[error("bool: invalid byte {byte:#04x} at byte {offset}")]
    InvalidBool { offset: u64, byte: u8 },

    #[error("value: unknown type marker {marker} at byte {offset}")]
    UnknownValueType { offset: u64, marker: u8 },

    #[error("string: invalid UTF-8 at byte {offset}")]
    InvalidUtf8 {
        offset: u64,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("{op}: varint overflows 64 bits at byte {offset}")]
    VarintOverflow { op: &'static str, offset: u64 },

    #[error("{op}: length {len} exceeds limit {limit} at byte {offset}")]
    LengthLimit {
        op: &'static str,
        offset: u64,
        len: u64,
        limit: usize,
    },

    #[error("time: ticks {0} are outside the representable range")]
    TimeOutOfRange(i64),

    #[error("{op}: value {value} does not fit the wire width")]
    ValueOutOfRange { op: &'static str, value: i128 },

    #[error("uuid: {0}")]
    InvalidUuid(String),

    #[error("codec <{0}> is not registered")]
    UnknownCodec(String),

    #[error("invalid tag {tag:?} on {type_name} field #{field}: {reason}")]
    InvalidTag {
        type_name: &'static str,
        field: usize,
        tag: String,
        reason: &'static str,
    },

    #[error("codec <{codec}> cannot handle target type {target}")]
    UnsupportedTarget { codec: String, target: &'static str },

    #[error("{type_name} has no field #{field}")]
    NoSuchField {
        type_name: &'static str,
        field: usize,
    },

    #[error("nesting depth limit {0} exceeded")]
    DepthExceeded(usize),

    #[error("{op}: consumed {consumed} bytes but only {available} were available")]
    OverConsumed {
        op: &'static str,
        consumed: usize,
        available: usize,
    },

    #[error("{0}: required value is not set")]
    MissingValue(&'static str),

    #[error("Registry error: {0}")]
    RegistryError(&'static str),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl CodecError {
    /// Classify this error into one of the coarse [`ErrorKind`]s.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CodecError::Io { .. } => ErrorKind::Io,
            CodecError::NullExpected { .. }
            | CodecError::InvalidBool { .. }
            | CodecError::UnknownValueType { .. }
            | CodecError::InvalidUtf8 { .. }
            | CodecError::VarintOverflow { .. }
            | CodecError::LengthLimit { .. }
            | CodecError::TimeOutOfRange(_)
            | CodecError::ValueOutOfRange { .. }
            | CodecError::InvalidUuid(_)
            | CodecError::Custom(_) => ErrorKind::Format,
            CodecError::UnknownCodec(_)
            | CodecError::InvalidTag { .. }
            | CodecError::RegistryError(_) => ErrorKind::Schema,
            CodecError::UnsupportedTarget { .. }
            | CodecError::NoSuchField { .. }
            | CodecError::DepthExceeded(_)
            | CodecError::OverConsumed { .. } => ErrorKind::Type,
            CodecError::MissingValue(_) => ErrorKind::InvalidCall,
            CodecError::ConfigError(_) => ErrorKind::Config,
        }
    }

    /// Byte offset in the stream at which the error was detected, when known.
    pub fn offset(&self) -> Option<u64> {
        match self {
            CodecError::Io { offset, .. }
            | CodecError::NullExpected { offset, .. }
            | CodecError::InvalidBool { offset, .. }
            | CodecError::UnknownValueType { offset, .. }
            | CodecError::InvalidUtf8 { offset, .. }
            | CodecError::VarintOverflow { offset, .. }
            | CodecError::LengthLimit { offset, .. } => Some(*offset),
            _ => None,
        }
    }

    /// True when the source ended before a value was complete.
    pub fn is_truncated(&self) -> bool {
        matches!(self, CodecError::Io { source, .. } if source.kind() == io::ErrorKind::UnexpectedEof)
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
