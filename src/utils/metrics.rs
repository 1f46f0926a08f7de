//! Observability and Metrics
//!
//! Counters for encode/decode traffic, kept as relaxed atomics so concurrent
//! calls on independent streams can share one collector.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Top-level values encoded
    pub values_encoded: AtomicU64,
    /// Top-level values decoded
    pub values_decoded: AtomicU64,
    /// Total bytes written
    pub bytes_written: AtomicU64,
    /// Total bytes read
    pub bytes_read: AtomicU64,
    /// Failed encode calls
    pub encode_errors: AtomicU64,
    /// Failed decode calls
    pub decode_errors: AtomicU64,
    /// Fields handled by a registry codec
    pub overrides_dispatched: AtomicU64,
    /// Values that serialized themselves
    pub marshal_delegations: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            values_encoded: AtomicU64::new(0),
            values_decoded: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            encode_errors: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            overrides_dispatched: AtomicU64::new(0),
            marshal_delegations: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed encode call
    pub fn value_encoded(&self, byte_count: u64) {
        self.values_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a completed decode call
    pub fn value_decoded(&self, byte_count: u64) {
        self.values_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_error(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn override_dispatched(&self) {
        self.overrides_dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn marshal_delegated(&self) {
        self.marshal_delegations.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            values_encoded: self.values_encoded.load(Ordering::Relaxed),
            values_decoded: self.values_decoded.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            encode_errors: self.encode_errors.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            overrides_dispatched: self.overrides_dispatched.load(Ordering::Relaxed),
            marshal_delegations: self.marshal_delegations.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            values_encoded = snapshot.values_encoded,
            values_decoded = snapshot.values_decoded,
            bytes_written = snapshot.bytes_written,
            bytes_read = snapshot.bytes_read,
            encode_errors = snapshot.encode_errors,
            decode_errors = snapshot.decode_errors,
            overrides_dispatched = snapshot.overrides_dispatched,
            marshal_delegations = snapshot.marshal_delegations,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone)]
pub struct MetricsSnapshot {
    pub values_encoded: u64,
    pub values_decoded: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub encode_errors: u64,
    pub decode_errors: u64,
    pub overrides_dispatched: u64,
    pub marshal_delegations: u64,
    pub uptime_seconds: u64,
}

static METRICS: once_cell::sync::Lazy<CodecMetrics> =
    once_cell::sync::Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}

/// Timer for measuring operation duration
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    /// Start timing an operation
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        debug!(
            operation = self.operation,
            duration_us = duration.as_micros() as u64,
            "Codec call completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.value_encoded(10);
        metrics.value_encoded(5);
        metrics.decode_error();
        metrics.override_dispatched();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.values_encoded, 2);
        assert_eq!(snapshot.bytes_written, 15);
        assert_eq!(snapshot.decode_errors, 1);
        assert_eq!(snapshot.overrides_dispatched, 1);
        assert_eq!(snapshot.values_decoded, 0);
    }
}
