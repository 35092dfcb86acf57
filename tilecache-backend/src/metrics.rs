//! Tile cache metrics.
//!
//! Enable the `metrics` feature to record these; without it every function
//! here is an empty inline stub.
//!
//! ## Naming Pattern
//!
//! - `tilecache_backend_operations_total` - store round-trips per operation
//! - `tilecache_backend_operation_duration_seconds` - round-trip latency per operation
//! - `tilecache_backend_errors_total` - contained store errors per operation
//! - `tilecache_backend_{read,write}_bytes_total` - payload volume
//! - `tilecache_backend_load_results_total` - load hits and misses
//!
//! Every metric carries a `backend` label; per-operation metrics also carry
//! `operation`.

use std::time::Duration;

#[cfg(feature = "metrics")]
use std::time::Instant;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

use crate::Operation;

/// Zero-cost timer for metrics collection.
///
/// Captures the start instant only when the `metrics` feature is enabled.
pub struct Timer {
    #[cfg(feature = "metrics")]
    start: Instant,
}

impl Timer {
    /// Starts a timer.
    #[inline]
    pub fn new() -> Self {
        Self {
            #[cfg(feature = "metrics")]
            start: Instant::now(),
        }
    }

    /// Elapsed time, or `Duration::ZERO` without the `metrics` feature.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        #[cfg(feature = "metrics")]
        {
            self.start.elapsed()
        }
        #[cfg(not(feature = "metrics"))]
        {
            Duration::ZERO
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "metrics")]
lazy_static! {
    /// Metric name for the store round-trip counter.
    pub static ref OPERATIONS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "tilecache_backend_operations_total",
            "Total number of tile cache operations that reached the store."
        );
        "tilecache_backend_operations_total"
    };

    /// Metric name for the operation latency histogram.
    pub static ref OPERATION_DURATION: &'static str = {
        metrics::describe_histogram!(
            "tilecache_backend_operation_duration_seconds",
            metrics::Unit::Seconds,
            "Duration of tile cache operations in seconds."
        );
        "tilecache_backend_operation_duration_seconds"
    };

    /// Metric name for the contained error counter.
    pub static ref ERRORS_TOTAL: &'static str = {
        metrics::describe_counter!(
            "tilecache_backend_errors_total",
            "Total number of store errors contained by the tile cache."
        );
        "tilecache_backend_errors_total"
    };

    /// Metric name for the bytes read counter.
    pub static ref READ_BYTES: &'static str = {
        metrics::describe_counter!(
            "tilecache_backend_read_bytes_total",
            "Total tile payload bytes loaded from the store."
        );
        "tilecache_backend_read_bytes_total"
    };

    /// Metric name for the bytes written counter.
    pub static ref WRITE_BYTES: &'static str = {
        metrics::describe_counter!(
            "tilecache_backend_write_bytes_total",
            "Total tile payload bytes written to the store."
        );
        "tilecache_backend_write_bytes_total"
    };

    /// Metric name for the load hit/miss counter.
    pub static ref LOAD_RESULTS: &'static str = {
        metrics::describe_counter!(
            "tilecache_backend_load_results_total",
            "Tile loads by result (hit or miss)."
        );
        "tilecache_backend_load_results_total"
    };
}

/// Record one operation and its duration.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_operation(backend: &str, operation: Operation, duration: Duration) {
    metrics::counter!(
        *OPERATIONS_TOTAL,
        "backend" => backend.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
    metrics::histogram!(
        *OPERATION_DURATION,
        "backend" => backend.to_string(),
        "operation" => operation.as_str()
    )
    .record(duration.as_secs_f64());
}

#[cfg(not(feature = "metrics"))]
#[inline]
#[allow(missing_docs)]
pub fn record_operation(_backend: &str, _operation: Operation, _duration: Duration) {}

/// Record a contained store error.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_error(backend: &str, operation: Operation) {
    metrics::counter!(
        *ERRORS_TOTAL,
        "backend" => backend.to_string(),
        "operation" => operation.as_str()
    )
    .increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
#[allow(missing_docs)]
pub fn record_error(_backend: &str, _operation: Operation) {}

/// Record payload bytes loaded.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_read_bytes(backend: &str, bytes: usize) {
    metrics::counter!(*READ_BYTES, "backend" => backend.to_string()).increment(bytes as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
#[allow(missing_docs)]
pub fn record_read_bytes(_backend: &str, _bytes: usize) {}

/// Record payload bytes written.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_write_bytes(backend: &str, bytes: usize) {
    metrics::counter!(*WRITE_BYTES, "backend" => backend.to_string()).increment(bytes as u64);
}

#[cfg(not(feature = "metrics"))]
#[inline]
#[allow(missing_docs)]
pub fn record_write_bytes(_backend: &str, _bytes: usize) {}

/// Record whether a load found the tile.
#[cfg(feature = "metrics")]
#[inline]
pub fn record_load_result(backend: &str, hit: bool) {
    let result = if hit { "hit" } else { "miss" };
    metrics::counter!(*LOAD_RESULTS, "backend" => backend.to_string(), "result" => result)
        .increment(1);
}

#[cfg(not(feature = "metrics"))]
#[inline]
#[allow(missing_docs)]
pub fn record_load_result(_backend: &str, _hit: bool) {}
