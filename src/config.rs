//! # Configuration Management
//!
//! Centralized configuration for the codec and its engine.
//!
//! [`CodecConfig`] is the file/environment facing structure; [`CodecOptions`] is the
//! small copyable value the encoder and decoder actually carry.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()`
//! - Direct instantiation with defaults
//! - Environment overrides via `from_env()`
//!
//! ## Resource Limits
//! - Decoded string and sequence lengths are checked before any allocation
//! - Nesting of records, sequences and indirections is bounded by `max_depth`

use crate::core::wire::{ReadLimits, DEFAULT_MAX_COLLECTION_LEN, DEFAULT_MAX_STRING_LEN};
use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

/// Protocol version requested when none is configured
pub const DEFAULT_PROTOCOL_VERSION: i64 = 0;

/// Default bound on nested records, sequences and indirections
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct CodecConfig {
    /// Engine configuration
    #[serde(default)]
    pub codec: CodecSettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl CodecConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| CodecError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| CodecError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    ///
    /// Unlike a TOML file, a malformed variable is reported rather than ignored.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(version) = env_parse::<i64>("RAS_CODEC_PROTOCOL_VERSION")? {
            config.codec.protocol_version = version;
        }

        if let Some(depth) = env_parse::<usize>("RAS_CODEC_MAX_DEPTH")? {
            config.codec.max_depth = depth;
        }

        if let Some(len) = env_parse::<usize>("RAS_CODEC_MAX_COLLECTION_LEN")? {
            config.codec.max_collection_len = len;
        }

        if let Some(len) = env_parse::<usize>("RAS_CODEC_MAX_STRING_LEN")? {
            config.codec.max_string_len = len;
        }

        if let Ok(level) = std::env::var("RAS_CODEC_LOG_LEVEL") {
            config.logging.log_level = Level::from_str(&level).map_err(|_| {
                CodecError::ConfigError(format!("Invalid RAS_CODEC_LOG_LEVEL: {level}"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| CodecError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| CodecError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Engine options described by the `codec` section
    pub fn options(&self) -> CodecOptions {
        self.codec.options()
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(CodecError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn env_parse<T: FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| CodecError::ConfigError(format!("Invalid {name}: {raw}"))),
        Err(_) => Ok(None),
    }
}

/// Engine settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecSettings {
    /// Protocol version requested for every encode/decode call
    pub protocol_version: i64,

    /// Maximum nesting of records, sequences and indirections
    pub max_depth: usize,

    /// Maximum decoded sequence element count
    pub max_collection_len: usize,

    /// Maximum decoded string length in bytes
    pub max_string_len: usize,
}

impl Default for CodecSettings {
    fn default() -> Self {
        Self {
            protocol_version: DEFAULT_PROTOCOL_VERSION,
            max_depth: DEFAULT_MAX_DEPTH,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
            max_string_len: DEFAULT_MAX_STRING_LEN,
        }
    }
}

impl CodecSettings {
    pub fn options(&self) -> CodecOptions {
        CodecOptions {
            version: self.protocol_version,
            max_depth: self.max_depth,
            max_collection_len: self.max_collection_len,
            max_string_len: self.max_string_len,
        }
    }

    /// Validate engine settings
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.protocol_version < 0 {
            errors.push(format!(
                "Protocol version cannot be negative: {}",
                self.protocol_version
            ));
        }

        if self.max_depth == 0 {
            errors.push("Max depth must be greater than 0".to_string());
        } else if self.max_depth > 1024 {
            errors.push(format!(
                "Max depth too large: {} (maximum: 1024)",
                self.max_depth
            ));
        }

        if self.max_collection_len == 0 {
            errors.push("Max collection length must be greater than 0".to_string());
        }

        if self.max_string_len == 0 {
            errors.push("Max string length must be greater than 0".to_string());
        } else if self.max_string_len > 256 * 1024 * 1024 {
            errors.push(format!(
                "Max string length too large: {} bytes (maximum recommended: 256 MB)",
                self.max_string_len
            ));
        }

        errors
    }
}

/// Options carried by a single encode or decode call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Requested protocol version; fields whose minimum version is above it are skipped
    pub version: i64,
    pub max_depth: usize,
    pub max_collection_len: usize,
    pub max_string_len: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        CodecSettings::default().options()
    }
}

impl CodecOptions {
    /// Default options at the given protocol version
    pub fn at_version(version: i64) -> Self {
        Self {
            version,
            ..Self::default()
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_collection_len(mut self, len: usize) -> Self {
        self.max_collection_len = len;
        self
    }

    pub fn with_max_string_len(mut self, len: usize) -> Self {
        self.max_string_len = len;
        self
    }

    /// Length limits handed to the wire reader
    pub fn read_limits(&self) -> ReadLimits {
        ReadLimits {
            max_string_len: self.max_string_len,
            max_collection_len: self.max_collection_len,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Log to a file instead of the console
    pub log_to_file: bool,

    /// Path to log file (if log_to_file is true)
    pub log_file_path: Option<String>,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("ras-codec"),
            log_level: Level::INFO,
            log_to_file: false,
            log_file_path: None,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.log_to_file && self.log_file_path.is_none() {
            errors.push("log_file_path must be specified when log_to_file is true".to_string());
        }
        errors
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_follow_settings() {
        let config = CodecConfig::default_with_overrides(|c| {
            c.codec.protocol_version = 10;
            c.codec.max_string_len = 4096;
        });
        let options = config.options();
        assert_eq!(options.version, 10);
        assert_eq!(options.read_limits().max_string_len, 4096);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[test]
    fn test_negative_version_rejected() {
        let config = CodecConfig::default_with_overrides(|c| c.codec.protocol_version = -1);
        assert!(config.validate_strict().is_err());
        assert!(CodecConfig::default().validate().is_empty());
    }
}
