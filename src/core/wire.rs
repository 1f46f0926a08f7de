//! # Wire Source and Sink
//!
//! Strictly sequential byte source and sink used by every codec in the crate.
//!
//! Both sides track the absolute byte offset so errors can name the position at
//! which a stream went wrong. Neither side seeks or backtracks.
//!
//! The reader keeps a small pushback buffer. It is only filled when a type that
//! decodes itself from the whole remaining buffer hands back the bytes it did not
//! consume; subsequent reads drain it before touching the underlying source.

use crate::error::{CodecError, Result};
use bytes::{Buf, Bytes};
use std::io::{self, Read, Write};

/// Default upper bound for a decoded string length (16 MB)
pub const DEFAULT_MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Default upper bound for a decoded sequence element count
pub const DEFAULT_MAX_COLLECTION_LEN: usize = 1024 * 1024;

/// Length limits applied by the reader before it allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadLimits {
    /// Largest accepted string payload in bytes
    pub max_string_len: usize,
    /// Largest accepted sequence element count
    pub max_collection_len: usize,
}

impl Default for ReadLimits {
    fn default() -> Self {
        Self {
            max_string_len: DEFAULT_MAX_STRING_LEN,
            max_collection_len: DEFAULT_MAX_COLLECTION_LEN,
        }
    }
}

/// Sequential byte source with offset tracking.
pub struct WireReader<'a> {
    inner: &'a mut dyn Read,
    pending: Bytes,
    offset: u64,
    limits: ReadLimits,
}

impl<'a> WireReader<'a> {
    pub fn new(inner: &'a mut dyn Read) -> Self {
        Self {
            inner,
            pending: Bytes::new(),
            offset: 0,
            limits: ReadLimits::default(),
        }
    }

    /// Replace the length limits enforced by this reader
    pub fn with_limits(mut self, limits: ReadLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Number of bytes consumed so far
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    #[inline]
    pub fn limits(&self) -> ReadLimits {
        self.limits
    }

    /// Fill `buf` completely or fail with an I/O error naming `op`.
    pub fn read_exact_op(&mut self, op: &'static str, buf: &mut [u8]) -> Result<()> {
        let start = self.offset;
        let from_pending = self.pending.len().min(buf.len());
        if from_pending > 0 {
            self.pending.copy_to_slice(&mut buf[..from_pending]);
        }

        if from_pending < buf.len() {
            self.inner
                .read_exact(&mut buf[from_pending..])
                .map_err(|source| CodecError::Io {
                    op,
                    offset: start,
                    source,
                })?;
        }

        self.offset += buf.len() as u64;
        Ok(())
    }

    /// Read exactly `N` bytes into an array
    #[inline]
    pub fn read_array<const N: usize>(&mut self, op: &'static str) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact_op(op, &mut buf)?;
        Ok(buf)
    }

    /// Read a single byte
    #[inline]
    pub fn read_u8_op(&mut self, op: &'static str) -> Result<u8> {
        let [b] = self.read_array::<1>(op)?;
        Ok(b)
    }

    /// Read `len` bytes into a fresh buffer
    pub fn read_vec(&mut self, op: &'static str, len: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.read_exact_op(op, &mut buf)?;
        Ok(buf)
    }

    /// Hand every remaining byte to `consume`, which returns how many it used.
    ///
    /// Bytes past the consumed prefix stay readable for subsequent calls.
    pub fn with_remaining<F>(&mut self, op: &'static str, consume: F) -> Result<usize>
    where
        F: FnOnce(Bytes) -> Result<usize>,
    {
        let mut rest = Vec::with_capacity(self.pending.len());
        rest.extend_from_slice(&self.pending);
        self.inner
            .read_to_end(&mut rest)
            .map_err(|source| CodecError::Io {
                op,
                offset: self.offset,
                source,
            })?;

        let buffer = Bytes::from(rest);
        let consumed = consume(buffer.clone())?;
        if consumed > buffer.len() {
            return Err(CodecError::OverConsumed {
                op,
                consumed,
                available: buffer.len(),
            });
        }

        self.pending = buffer.slice(consumed..);
        self.offset += consumed as u64;
        Ok(consumed)
    }

    /// Give up the reader, returning bytes already pulled from the source but not consumed.
    pub fn into_pending(self) -> Bytes {
        self.pending
    }
}

impl Read for WireReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = if self.pending.has_remaining() {
            let n = self.pending.len().min(buf.len());
            self.pending.copy_to_slice(&mut buf[..n]);
            n
        } else {
            self.inner.read(buf)?
        };
        self.offset += n as u64;
        Ok(n)
    }
}

/// Sequential byte sink with offset tracking.
pub struct WireWriter<'a> {
    inner: &'a mut dyn Write,
    offset: u64,
}

impl<'a> WireWriter<'a> {
    pub fn new(inner: &'a mut dyn Write) -> Self {
        Self { inner, offset: 0 }
    }

    /// Number of bytes written so far
    #[inline]
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Write all of `buf` or fail with an I/O error naming `op`.
    pub fn write_all_op(&mut self, op: &'static str, buf: &[u8]) -> Result<usize> {
        self.inner
            .write_all(buf)
            .map_err(|source| CodecError::Io {
                op,
                offset: self.offset,
                source,
            })?;
        self.offset += buf.len() as u64;
        Ok(buf.len())
    }
}

impl Write for WireWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.offset += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

    use super::*;

    #[test]
    fn test_reader_tracks_offset() {
        let data = [1u8, 2, 3, 4, 5];
        let mut src: &[u8] = &data;
        let mut reader = WireReader::new(&mut src);

        assert_eq!(reader.read_array::<2>("test").ok(), Some([1, 2]));
        assert_eq!(reader.offset(), 2);
        assert_eq!(reader.read_u8_op("test").ok(), Some(3));
        assert_eq!(reader.offset(), 3);
    }

    #[test]
    fn test_truncation_reports_start_offset() {
        let data = [1u8, 2, 3];
        let mut src: &[u8] = &data;
        let mut reader = WireReader::new(&mut src);
        let _ = reader.read_u8_op("first");

        match reader.read_array::<4>("int32") {
            Err(CodecError::Io { op, offset, .. }) => {
                assert_eq!(op, "int32");
                assert_eq!(offset, 1);
            }
            other => panic!("expected I/O error, got {other:?}"),
        }
    }

    #[test]
    fn test_with_remaining_pushes_back_tail() {
        let data = [9u8, 8, 7, 6];
        let mut src: &[u8] = &data;
        let mut reader = WireReader::new(&mut src);

        let consumed = reader
            .with_remaining("tail", |buf| {
                assert_eq!(&buf[..], &[9, 8, 7, 6]);
                Ok(1)
            })
            .expect("consume");
        assert_eq!(consumed, 1);
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read_array::<3>("rest").ok(), Some([8, 7, 6]));
        assert_eq!(reader.offset(), 4);
    }

    #[test]
    fn test_with_remaining_rejects_overconsumption() {
        let data = [1u8];
        let mut src: &[u8] = &data;
        let mut reader = WireReader::new(&mut src);
        match reader.with_remaining("tail", |_| Ok(2)) {
            Err(err @ CodecError::OverConsumed { .. }) => {
                assert_eq!(err.kind(), crate::error::ErrorKind::Type);
            }
            other => panic!("expected over-consumption error, got {other:?}"),
        }
    }

    #[test]
    fn test_into_pending_returns_unconsumed_tail() {
        let data = [3u8, 4, 5];
        let mut src: &[u8] = &data;
        let mut reader = WireReader::new(&mut src);
        reader.with_remaining("tail", |_| Ok(1)).expect("consume");
        assert_eq!(&reader.into_pending()[..], &[4, 5]);
    }

    #[test]
    fn test_writer_tracks_offset() {
        let mut out = Vec::new();
        let mut writer = WireWriter::new(&mut out);
        assert_eq!(writer.write_all_op("test", &[1, 2, 3]).ok(), Some(3));
        assert_eq!(writer.offset(), 3);
        assert_eq!(out, vec![1, 2, 3]);
    }
}
