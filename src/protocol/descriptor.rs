//! # Field Descriptors
//!
//! Every record field carries a tag of the form `codec,number,min_version`:
//!
//! | part | meaning | when empty |
//! |---|---|---|
//! | `codec` | registry codec name, or `-` to ignore the field | encode the field generically |
//! | `number` | position on the wire | `0` |
//! | `min_version` | first protocol version carrying the field | `0` |
//!
//! Trailing parts may be omitted. Descriptors are sorted by wire number, never by
//! declaration order, and cached per record type for the life of the process.

use crate::error::constants::{
    ERR_DESCRIPTOR_CACHE_LOCK, ERR_TAG_BAD_NUMBER, ERR_TAG_BAD_VERSION, ERR_TAG_TOO_MANY_PARTS,
};
use crate::error::{CodecError, Result};
use crate::protocol::record::Record;
use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// Tag codec part marking a field that never touches the wire
pub const IGNORE_MARKER: &str = "-";

/// Resolved metadata for one record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Wire position; descriptors are processed in ascending order
    pub number: i32,
    pub ignored: bool,
    /// Smallest protocol version at which the field is on the wire
    pub min_version: i64,
    /// Registry codec overriding generic encoding
    pub codec: Option<String>,
    /// Declaration index of the field within its record
    pub field_index: usize,
}

impl FieldDescriptor {
    /// True when the field is written and read at `version`.
    #[inline]
    pub fn is_present(&self, version: i64) -> bool {
        !self.ignored && self.min_version <= version
    }
}

/// Parse one field tag.
pub fn parse_tag(type_name: &'static str, field_index: usize, tag: &str) -> Result<FieldDescriptor> {
    let invalid = |reason: &'static str| CodecError::InvalidTag {
        type_name,
        field: field_index,
        tag: tag.to_string(),
        reason,
    };

    let mut descriptor = FieldDescriptor {
        number: 0,
        ignored: false,
        min_version: 0,
        codec: None,
        field_index,
    };

    for (position, part) in tag.split(',').map(str::trim).enumerate() {
        match position {
            0 => match part {
                IGNORE_MARKER => descriptor.ignored = true,
                "" => {}
                name => descriptor.codec = Some(name.to_string()),
            },
            1 if !part.is_empty() => {
                descriptor.number = part.parse().map_err(|_| invalid(ERR_TAG_BAD_NUMBER))?;
            }
            2 if !part.is_empty() => {
                descriptor.min_version = part.parse().map_err(|_| invalid(ERR_TAG_BAD_VERSION))?;
            }
            1 | 2 => {}
            _ => return Err(invalid(ERR_TAG_TOO_MANY_PARTS)),
        }
    }

    Ok(descriptor)
}

/// Parse all tags of a record and order them by wire number.
///
/// The sort is stable, so fields sharing a number keep declaration order.
pub fn build_descriptors(type_name: &'static str, tags: &[&str]) -> Result<Vec<FieldDescriptor>> {
    let mut descriptors = tags
        .iter()
        .enumerate()
        .map(|(index, tag)| parse_tag(type_name, index, tag))
        .collect::<Result<Vec<_>>>()?;

    descriptors.sort_by_key(|d| d.number);
    Ok(descriptors)
}

type DescriptorCache = RwLock<HashMap<TypeId, Arc<[FieldDescriptor]>>>;

static DESCRIPTORS: Lazy<DescriptorCache> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Ordered descriptors of `T`, built on first use and cached afterwards.
pub fn resolve<T: Record>() -> Result<Arc<[FieldDescriptor]>> {
    let key = TypeId::of::<T>();

    {
        let cache = DESCRIPTORS
            .read()
            .map_err(|_| CodecError::RegistryError(ERR_DESCRIPTOR_CACHE_LOCK))?;
        if let Some(found) = cache.get(&key) {
            return Ok(Arc::clone(found));
        }
    }

    let built: Arc<[FieldDescriptor]> = build_descriptors(T::type_name(), T::field_tags())?.into();
    debug!(
        record = T::type_name(),
        fields = built.len(),
        "Resolved field descriptors"
    );

    let mut cache = DESCRIPTORS
        .write()
        .map_err(|_| CodecError::RegistryError(ERR_DESCRIPTOR_CACHE_LOCK))?;
    // Another thread may have raced us; keep whichever landed first.
    let entry = cache.entry(key).or_insert(built);
    Ok(Arc::clone(entry))
}
