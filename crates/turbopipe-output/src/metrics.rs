//! Retry output metrics
//!
//! Every update is kept in local atomics, readable through
//! [`RetryMetrics::snapshot`], and mirrored to the `metrics` facade so an
//! installed exporter sees it under the names below.

use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Gauge: retry outputs currently running.
pub const RUNNING: &str = "retry.running";
/// Counter: transactions pulled from upstream.
pub const COUNT: &str = "retry.count";
/// Counter: transactions eventually delivered.
pub const SEND_SUCCESS: &str = "retry.send.success";
/// Counter: message parts eventually delivered.
pub const PARTS_SEND_SUCCESS: &str = "retry.parts.send.success";
/// Counter: failed delivery attempts.
pub const SEND_ERROR: &str = "retry.send.error";
/// Counter: transactions given up on.
pub const END_OF_RETRIES: &str = "retry.end_of_retries";

/// Live counters for one retry output.
#[derive(Debug, Default)]
pub struct RetryMetrics {
    running: AtomicI64,
    count: AtomicU64,
    send_success: AtomicU64,
    parts_send_success: AtomicU64,
    send_error: AtomicU64,
    end_of_retries: AtomicU64,
}

impl RetryMetrics {
    /// Create zeroed metrics.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn started(&self) {
        self.running.fetch_add(1, Ordering::Relaxed);
        ::metrics::gauge!(RUNNING).increment(1.0);
    }

    pub(crate) fn stopped(&self) {
        self.running.fetch_sub(1, Ordering::Relaxed);
        ::metrics::gauge!(RUNNING).decrement(1.0);
    }

    pub(crate) fn received(&self) {
        self.count.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(COUNT).increment(1);
    }

    pub(crate) fn delivered(&self, parts: usize) {
        self.send_success.fetch_add(1, Ordering::Relaxed);
        self.parts_send_success.fetch_add(parts as u64, Ordering::Relaxed);
        ::metrics::counter!(SEND_SUCCESS).increment(1);
        ::metrics::counter!(PARTS_SEND_SUCCESS).increment(parts as u64);
    }

    pub(crate) fn failed_attempt(&self) {
        self.send_error.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(SEND_ERROR).increment(1);
    }

    pub(crate) fn gave_up(&self) {
        self.end_of_retries.fetch_add(1, Ordering::Relaxed);
        ::metrics::counter!(END_OF_RETRIES).increment(1);
    }

    /// Point-in-time copy of all counters.
    pub fn snapshot(&self) -> RetryMetricsSnapshot {
        RetryMetricsSnapshot {
            running: self.running.load(Ordering::Relaxed),
            count: self.count.load(Ordering::Relaxed),
            send_success: self.send_success.load(Ordering::Relaxed),
            parts_send_success: self.parts_send_success.load(Ordering::Relaxed),
            send_error: self.send_error.load(Ordering::Relaxed),
            end_of_retries: self.end_of_retries.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of [`RetryMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RetryMetricsSnapshot {
    /// 1 while the output's loop is alive
    pub running: i64,
    /// Transactions pulled from upstream
    pub count: u64,
    /// Transactions delivered
    pub send_success: u64,
    /// Message parts delivered
    pub parts_send_success: u64,
    /// Failed attempts
    pub send_error: u64,
    /// Transactions answered with `Noack`
    pub end_of_retries: u64,
}
