//! Record types and field access for the engine.
//!
//! A record is a struct whose fields are visited by index. The [`ras_record!`]
//! macro declares the struct and generates the visitor so that no runtime type
//! inspection is needed:
//!
//! ```rust
//! use ras_codec::ras_record;
//! use uuid::Uuid;
//!
//! ras_record! {
//!     #[derive(Debug, Default, Clone, PartialEq)]
//!     pub struct ClusterInfo {
//!         #[ras(",1")]
//!         pub uuid: Uuid,
//!         #[ras("string,2")]
//!         pub name: String,
//!         #[ras(",3,10")]
//!         pub restart_interval: i32,
//!         #[ras("-")]
//!         pub cached: bool,
//!     }
//! }
//!
//! let info = ClusterInfo { name: "main".into(), ..Default::default() };
//! let bytes = ras_codec::encode(&info, 9).unwrap();
//! assert_eq!(bytes.len(), 16 + 5);
//! ```
//!
//! [`ras_record!`]: crate::ras_record

use crate::core::value::Value;
use crate::error::{CodecError, Result};
use crate::protocol::decoder::Decoder;
use crate::protocol::encoder::Encoder;
use chrono::{DateTime, Utc};
use std::any::Any;
use uuid::Uuid;

/// Read access to a field handed to a registry codec.
pub struct SlotRef<'a> {
    value: &'a dyn Any,
    type_name: &'static str,
}

impl<'a> SlotRef<'a> {
    pub fn new<T: Any>(value: &'a T) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn downcast<T: Any>(&self) -> Option<&'a T> {
        self.value.downcast_ref::<T>()
    }

    /// Rust type name of the field, for error messages
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Write access to a freshly reset field handed to a registry codec.
pub struct SlotMut<'a> {
    value: &'a mut dyn Any,
    type_name: &'static str,
}

impl<'a> SlotMut<'a> {
    pub fn new<T: Any>(value: &'a mut T) -> Self {
        Self {
            value,
            type_name: std::any::type_name::<T>(),
        }
    }

    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.value.downcast_mut::<T>()
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Exposes a field to registry codecs, looking through indirections.
///
/// `Option<T>` and `Box<T>` forward to their pointee. On the write side the
/// pointee is always replaced by a fresh `T::default()` first.
pub trait FieldSlot {
    fn slot_ref(&self) -> Result<SlotRef<'_>>;
    fn slot_mut(&mut self) -> SlotMut<'_>;
}

/// Implements [`FieldSlot`] for types a registry codec sees as a whole.
#[macro_export]
macro_rules! impl_leaf_slot {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $crate::protocol::FieldSlot for $ty {
                fn slot_ref(&self) -> $crate::error::Result<$crate::protocol::SlotRef<'_>> {
                    Ok($crate::protocol::SlotRef::new(self))
                }

                fn slot_mut(&mut self) -> $crate::protocol::SlotMut<'_> {
                    $crate::protocol::SlotMut::new(self)
                }
            }
        )*
    };
}

impl_leaf_slot!(
    bool,
    u8,
    i8,
    i16,
    u16,
    i32,
    u32,
    i64,
    u64,
    isize,
    usize,
    f32,
    f64,
    String,
    Uuid,
    DateTime<Utc>,
    Value,
    [u8; 16],
);

impl<T: Any> FieldSlot for Vec<T> {
    fn slot_ref(&self) -> Result<SlotRef<'_>> {
        Ok(SlotRef::new(self))
    }

    fn slot_mut(&mut self) -> SlotMut<'_> {
        SlotMut::new(self)
    }
}

impl<T: FieldSlot + Default> FieldSlot for Option<T> {
    fn slot_ref(&self) -> Result<SlotRef<'_>> {
        match self {
            Some(inner) => inner.slot_ref(),
            None => Err(CodecError::MissingValue(std::any::type_name::<Self>())),
        }
    }

    fn slot_mut(&mut self) -> SlotMut<'_> {
        self.insert(T::default()).slot_mut()
    }
}

impl<T: FieldSlot + Default> FieldSlot for Box<T> {
    fn slot_ref(&self) -> Result<SlotRef<'_>> {
        (**self).slot_ref()
    }

    fn slot_mut(&mut self) -> SlotMut<'_> {
        *self = Box::default();
        (**self).slot_mut()
    }
}

/// A struct whose fields the engine visits by declaration index.
///
/// Implemented by [`ras_record!`](crate::ras_record); hand implementations must
/// keep `field_tags` and the index-based accessors in the same order.
pub trait Record: 'static {
    fn type_name() -> &'static str;

    /// One `codec,number,min_version` tag per field, in declaration order
    fn field_tags() -> &'static [&'static str];

    fn encode_field(&self, index: usize, enc: &mut Encoder<'_>) -> Result<()>;

    fn decode_field(&mut self, index: usize, dec: &mut Decoder<'_>) -> Result<()>;

    fn field_slot(&self, index: usize) -> Result<SlotRef<'_>>;

    fn field_slot_mut(&mut self, index: usize) -> Result<SlotMut<'_>>;
}

/// Declare a record struct and derive its wire handling.
///
/// Each field must start with a `#[ras("codec,number,min_version")]` attribute;
/// further attributes may follow it. Every field type must implement
/// [`Encode`](crate::protocol::Encode), [`Decode`](crate::protocol::Decode) and
/// [`FieldSlot`].
#[macro_export]
macro_rules! ras_record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                #[ras($tag:literal)]
                $(#[$field_meta:meta])*
                $field_vis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$field_meta])*
                $field_vis $field: $ty,
            )*
        }

        impl $crate::protocol::Record for $name {
            fn type_name() -> &'static str {
                stringify!($name)
            }

            fn field_tags() -> &'static [&'static str] {
                &[$($tag),*]
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn encode_field(
                &self,
                index: usize,
                enc: &mut $crate::protocol::Encoder<'_>,
            ) -> $crate::error::Result<()> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return enc.encode_value(&self.$field);
                    }
                    position += 1;
                )*
                Err($crate::error::CodecError::NoSuchField {
                    type_name: stringify!($name),
                    field: index,
                })
            }

            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn decode_field(
                &mut self,
                index: usize,
                dec: &mut $crate::protocol::Decoder<'_>,
            ) -> $crate::error::Result<()> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return dec.decode_value(&mut self.$field);
                    }
                    position += 1;
                )*
                Err($crate::error::CodecError::NoSuchField {
                    type_name: stringify!($name),
                    field: index,
                })
            }

            #[allow(unused_assignments, unused_mut)]
            fn field_slot(
                &self,
                index: usize,
            ) -> $crate::error::Result<$crate::protocol::SlotRef<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return $crate::protocol::FieldSlot::slot_ref(&self.$field);
                    }
                    position += 1;
                )*
                Err($crate::error::CodecError::NoSuchField {
                    type_name: stringify!($name),
                    field: index,
                })
            }

            #[allow(unused_assignments, unused_mut)]
            fn field_slot_mut(
                &mut self,
                index: usize,
            ) -> $crate::error::Result<$crate::protocol::SlotMut<'_>> {
                let mut position = 0usize;
                $(
                    if index == position {
                        return Ok($crate::protocol::FieldSlot::slot_mut(&mut self.$field));
                    }
                    position += 1;
                )*
                Err($crate::error::CodecError::NoSuchField {
                    type_name: stringify!($name),
                    field: index,
                })
            }
        }

        impl $crate::protocol::Encode for $name {
            fn encode(&self, enc: &mut $crate::protocol::Encoder<'_>) -> $crate::error::Result<()> {
                $crate::protocol::encode_record(self, enc)
            }
        }

        impl $crate::protocol::Decode for $name {
            fn decode(&mut self, dec: &mut $crate::protocol::Decoder<'_>) -> $crate::error::Result<()> {
                $crate::protocol::decode_record(self, dec)
            }
        }

        $crate::impl_leaf_slot!($name);
    };
}
