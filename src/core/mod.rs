//! # Core Wire Codec
//!
//! Stateless reading and writing of the RAS wire primitives.
//!
//! ## Components
//! - **Wire**: sequential source/sink with offset tracking and read limits
//! - **Primitive**: fixed-width scalars, UUIDs, size and nullable-size varints
//! - **Text**: strings and epoch-tick timestamps
//! - **Value**: dynamically typed values prefixed by a type marker
//!
//! ## Wire Format
//! ```text
//! int16/32/64, float32/64   big-endian, fixed width
//! bool                      0x01 / 0x00
//! size                      base-128 varint, 0x80 = continuation
//! nullable-size             0x80 alone = null; else 6 bits in byte 0 (0x40 = continuation)
//! string                    nullable-size length + UTF-8 bytes, empty = 0x00
//! time                      int64 ticks = unix_ms * 10 + 621355968000000
//! ```
//!
//! Every reader method pulls exactly the bytes of one value and never looks
//! ahead, so values can be decoded straight off a socket.

pub mod primitive;
pub mod text;
pub mod value;
pub mod wire;

pub use primitive::{EMPTY_BYTE, NULL_BYTE};
pub use text::{ticks_from_unix_millis, unix_millis_from_ticks, EPOCH_DELTA};
pub use value::{Value, ValueType};
pub use wire::{ReadLimits, WireReader, WireWriter};
