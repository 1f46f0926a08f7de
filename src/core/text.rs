//! # String and Time Codec
//!
//! Strings are a nullable-size length followed by UTF-8 bytes; an empty string is
//! the single byte `0x00` with no payload. Times are signed 64-bit big-endian
//! ticks of 100 ns counted from 0001-01-01, carried at millisecond precision.

use crate::core::wire::{WireReader, WireWriter};
use crate::error::{CodecError, Result};
use chrono::{DateTime, Utc};

/// Ticks between 0001-01-01 and the Unix epoch, at 10 ticks per millisecond
pub const EPOCH_DELTA: i64 = 621_355_968_000_000;

/// Ticks per millisecond on the wire
pub const TICKS_PER_MILLI: i64 = 10;

/// Convert Unix milliseconds to wire ticks.
pub fn ticks_from_unix_millis(millis: i64) -> Result<i64> {
    millis
        .checked_mul(TICKS_PER_MILLI)
        .and_then(|t| t.checked_add(EPOCH_DELTA))
        .ok_or(CodecError::ValueOutOfRange {
            op: "time",
            value: i128::from(millis),
        })
}

/// Convert wire ticks to Unix milliseconds; sub-millisecond ticks are truncated.
pub fn unix_millis_from_ticks(ticks: i64) -> i64 {
    // |ticks - EPOCH_DELTA| / 10 always fits back into i64
    ((i128::from(ticks) - i128::from(EPOCH_DELTA)) / i128::from(TICKS_PER_MILLI)) as i64
}

impl WireReader<'_> {
    /// Read string payload bytes without UTF-8 validation
    pub fn read_string_bytes(&mut self) -> Result<Vec<u8>> {
        let offset = self.offset();
        let len = self.read_nullable_size()?;
        if len == 0 {
            return Ok(Vec::new());
        }

        let limit = self.limits().max_string_len;
        let len = match usize::try_from(len) {
            Ok(n) if n <= limit => n,
            _ => {
                return Err(CodecError::LengthLimit {
                    op: "string",
                    offset,
                    len,
                    limit,
                })
            }
        };

        self.read_vec("string", len)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.offset();
        let bytes = self.read_string_bytes()?;
        String::from_utf8(bytes).map_err(|source| CodecError::InvalidUtf8 { offset, source })
    }

    /// Read a time value as Unix milliseconds
    pub fn read_time_millis(&mut self) -> Result<i64> {
        let buf = self.read_array::<8>("time")?;
        Ok(unix_millis_from_ticks(i64::from_be_bytes(buf)))
    }

    pub fn read_time(&mut self) -> Result<DateTime<Utc>> {
        let buf = self.read_array::<8>("time")?;
        let ticks = i64::from_be_bytes(buf);
        DateTime::from_timestamp_millis(unix_millis_from_ticks(ticks))
            .ok_or(CodecError::TimeOutOfRange(ticks))
    }
}

impl WireWriter<'_> {
    /// Write raw bytes as a string payload
    pub fn write_string_bytes(&mut self, value: &[u8]) -> Result<usize> {
        if value.is_empty() {
            return self.write_null();
        }

        let prefix = self.write_nullable_size(value.len() as u64)?;
        let body = self.write_all_op("string", value)?;
        Ok(prefix + body)
    }

    pub fn write_string(&mut self, value: &str) -> Result<usize> {
        self.write_string_bytes(value.as_bytes())
    }

    /// Write Unix milliseconds as a time value
    pub fn write_time_millis(&mut self, millis: i64) -> Result<usize> {
        let ticks = ticks_from_unix_millis(millis)?;
        self.write_all_op("time", &ticks.to_be_bytes())
    }

    pub fn write_time(&mut self, value: &DateTime<Utc>) -> Result<usize> {
        self.write_time_millis(value.timestamp_millis())
    }
}
