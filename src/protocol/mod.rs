//! # Record Engine
//!
//! Schema-driven encoding of whole values on top of the core wire codec.
//!
//! ## Components
//! - **Descriptor**: field tag parsing, ordering and per-type caching
//! - **Record**: the `Record` trait and the `ras_record!` macro
//! - **Registry**: named field-level codecs used as overrides
//! - **Marshal**: opt-in self-serialization for types with their own wire form
//! - **Encoder / Decoder**: the generic walk over records, sequences and indirections
//!
//! ## Versioning
//! Every call carries a protocol version. A field tagged with a minimum version
//! above it is neither written nor read, so both peers must use the same version
//! for a payload to round-trip.

mod builtins;
pub mod decoder;
pub mod descriptor;
pub mod encoder;
pub mod marshal;
pub mod record;
pub mod registry;

pub use decoder::{decode_record, Decode, Decoder};
pub use descriptor::FieldDescriptor;
pub use encoder::{encode_record, Encode, Encoder};
pub use marshal::{Marshal, Unmarshal, UnmarshalBytes, Unmarshaler};
pub use record::{FieldSlot, Record, SlotMut, SlotRef};
pub use registry::{Codec, CodecRegistry};
