use crate::core::wire::{WireReader, WireWriter};
use crate::error::constants::{
    ERR_EMPTY_CODEC_NAME, ERR_REGISTRY_READ_LOCK, ERR_REGISTRY_WRITE_LOCK,
};
use crate::error::{CodecError, Result};
use crate::protocol::builtins;
use crate::protocol::record::{SlotMut, SlotRef};
use once_cell::sync::Lazy;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

type EncodeFn = dyn Fn(&mut WireWriter<'_>, SlotRef<'_>) -> Result<usize> + Send + Sync + 'static;
type DecodeFn = dyn Fn(&mut WireReader<'_>, SlotMut<'_>) -> Result<usize> + Send + Sync + 'static;

/// A named pair of field-level encode and decode functions.
#[derive(Clone)]
pub struct Codec {
    name: Cow<'static, str>,
    encode: Arc<EncodeFn>,
    decode: Arc<DecodeFn>,
}

impl Codec {
    pub fn new<E, D>(name: impl Into<Cow<'static, str>>, encode: E, decode: D) -> Self
    where
        E: Fn(&mut WireWriter<'_>, SlotRef<'_>) -> Result<usize> + Send + Sync + 'static,
        D: Fn(&mut WireReader<'_>, SlotMut<'_>) -> Result<usize> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    /// Name the codec was registered under first
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn encode(&self, w: &mut WireWriter<'_>, slot: SlotRef<'_>) -> Result<usize> {
        (self.encode)(w, slot)
    }

    #[inline]
    pub fn decode(&self, r: &mut WireReader<'_>, slot: SlotMut<'_>) -> Result<usize> {
        (self.decode)(r, slot)
    }
}

impl std::fmt::Debug for Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("name", &self.name).finish()
    }
}

/// Case-insensitive name → codec table used for field overrides.
///
/// Lookups take a read lock and clone two `Arc`s, so a warmed registry can serve
/// many threads. Registration is expected to finish before concurrent encode or
/// decode traffic starts: a name added mid-flight may or may not be seen by calls
/// already running. Registering an existing name replaces it.
pub struct CodecRegistry {
    codecs: Arc<RwLock<HashMap<Cow<'static, str>, Codec>>>,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL: Lazy<CodecRegistry> = Lazy::new(CodecRegistry::with_builtins);

impl CodecRegistry {
    /// Empty registry without built-ins
    pub fn new() -> Self {
        Self {
            codecs: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Registry holding every built-in primitive codec
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        if let Ok(mut codecs) = registry.codecs.write() {
            for (names, codec) in builtins::all() {
                for name in names.split_whitespace() {
                    codecs.insert(Cow::Borrowed(name), codec.clone());
                }
            }
        }
        registry
    }

    /// Process-wide registry, created with the built-ins on first use
    pub fn global() -> &'static CodecRegistry {
        &GLOBAL
    }

    /// Register `encode`/`decode` under every whitespace-separated name in `names`.
    pub fn register<E, D>(&self, names: &str, encode: E, decode: D) -> Result<()>
    where
        E: Fn(&mut WireWriter<'_>, SlotRef<'_>) -> Result<usize> + Send + Sync + 'static,
        D: Fn(&mut WireReader<'_>, SlotMut<'_>) -> Result<usize> + Send + Sync + 'static,
    {
        let aliases: Vec<String> = names.split_whitespace().map(str::to_lowercase).collect();
        let first = aliases
            .first()
            .cloned()
            .ok_or(CodecError::RegistryError(ERR_EMPTY_CODEC_NAME))?;

        let codec = Codec::new(first, encode, decode);

        let mut codecs = self
            .codecs
            .write()
            .map_err(|_| CodecError::RegistryError(ERR_REGISTRY_WRITE_LOCK))?;

        for alias in aliases {
            debug!(codec = %alias, "Registering codec");
            codecs.insert(Cow::Owned(alias), codec.clone());
        }
        Ok(())
    }

    /// Find the codec registered under `name`, ignoring case.
    pub fn lookup(&self, name: &str) -> Result<Codec> {
        let codecs = self
            .codecs
            .read()
            .map_err(|_| CodecError::RegistryError(ERR_REGISTRY_READ_LOCK))?;

        let key = name.trim();
        let found = match codecs.get(key) {
            Some(codec) => Some(codec),
            None => codecs.get(key.to_lowercase().as_str()),
        };

        found
            .cloned()
            .ok_or_else(|| CodecError::UnknownCodec(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_ok()
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = match self.codecs.read() {
            Ok(codecs) => codecs.keys().map(|k| k.to_string()).collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used)]

    use super::*;

    #[test]
    fn test_builtins_and_aliases() {
        let registry = CodecRegistry::with_builtins();
        for name in ["int", "INT32", "uint32", "Null-Size", "time", "uuid", "char"] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert_eq!(registry.lookup("int32").unwrap().name(), "int");
        assert!(matches!(
            registry.lookup("int128"),
            Err(CodecError::UnknownCodec(name)) if name == "int128"
        ));
    }

    #[test]
    fn test_register_replaces_existing() {
        let registry = CodecRegistry::with_builtins();
        registry
            .register("Int  custom", |w, _| w.write_byte(0xEE), |r, _| r.read_byte().map(|_| 1))
            .unwrap();

        assert_eq!(registry.lookup("int").unwrap().name(), "int");
        assert!(registry.contains("CUSTOM"));

        let value = 5i32;
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);
        registry
            .lookup("int")
            .unwrap()
            .encode(&mut writer, SlotRef::new(&value))
            .unwrap();
        assert_eq!(out, vec![0xEE]);
    }

    #[test]
    fn test_register_needs_a_name() {
        let registry = CodecRegistry::new();
        assert!(matches!(
            registry.register("   ", |_, _| Ok(0), |_, _| Ok(0)),
            Err(CodecError::RegistryError(_))
        ));
        assert!(registry.names().is_empty());
    }
}
