//! Recorder metrics

use core::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of recorder counters
///
/// All counters are monotonically increasing over the tracer's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TracingMetrics {
    /// Events stored in a buffer
    pub events_recorded: u64,

    /// Events dropped because the active buffer was full
    pub events_dropped: u64,

    /// Events written to the sink
    pub events_flushed: u64,

    /// Completed flushes, including the final one at close
    pub flushes: u64,

    /// Bytes written to the sink, preamble and closing included
    pub bytes_written: u64,

    /// Copied string arguments cut to the configured limit
    pub args_truncated: u64,
}

impl TracingMetrics {
    /// Create new metrics with zero values
    pub fn new() -> Self {
        Self::default()
    }

    /// Events recorded but not yet written
    pub fn events_pending(&self) -> u64 {
        self.events_recorded.saturating_sub(self.events_flushed)
    }

    /// Fraction of record attempts that were dropped
    pub fn drop_rate(&self) -> f64 {
        let total = self.events_recorded.saturating_add(self.events_dropped);
        if total == 0 {
            return 0.0;
        }
        (self.events_dropped as f64) / (total as f64)
    }

    /// Check if the drop rate is within acceptable bounds
    pub fn is_healthy(&self) -> bool {
        self.drop_rate() < 0.01
    }

    /// Merge metrics from another instance
    pub fn merge(&mut self, other: &TracingMetrics) {
        self.events_recorded = self.events_recorded.saturating_add(other.events_recorded);
        self.events_dropped = self.events_dropped.saturating_add(other.events_dropped);
        self.events_flushed = self.events_flushed.saturating_add(other.events_flushed);
        self.flushes = self.flushes.saturating_add(other.flushes);
        self.bytes_written = self.bytes_written.saturating_add(other.bytes_written);
        self.args_truncated = self.args_truncated.saturating_add(other.args_truncated);
    }
}

impl core::fmt::Display for TracingMetrics {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "TracingMetrics(recorded={}, dropped={}, flushed={}, flushes={}, bytes={}, truncated={}, drop_rate={:.4}%)",
            self.events_recorded,
            self.events_dropped,
            self.events_flushed,
            self.flushes,
            self.bytes_written,
            self.args_truncated,
            self.drop_rate() * 100.0
        )
    }
}

/// Live counters behind [`TracingMetrics`]
///
/// Mostly relaxed atomics: values are eventually consistent. The only
/// ordering kept is that an event is counted as recorded before its slot is
/// released, and so before any flush can count it as flushed.
#[derive(Debug, Default)]
pub(crate) struct AtomicMetrics {
    events_recorded: AtomicU64,
    events_dropped: AtomicU64,
    events_flushed: AtomicU64,
    flushes: AtomicU64,
    bytes_written: AtomicU64,
    args_truncated: AtomicU64,
}

impl AtomicMetrics {
    #[inline]
    pub(crate) fn inc_recorded(&self) {
        self.events_recorded.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn inc_dropped(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Release pairs with the acquire in [`snapshot`](Self::snapshot), so a
    /// snapshot never shows more events flushed than recorded.
    pub(crate) fn add_flushed(&self, events: u64) {
        self.events_flushed.fetch_add(events, Ordering::Release);
    }

    pub(crate) fn inc_flushes(&self) {
        self.flushes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn add_bytes(&self, bytes: usize) {
        self.bytes_written
            .fetch_add(u64::try_from(bytes).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn add_truncated(&self, args: u64) {
        self.args_truncated.fetch_add(args, Ordering::Relaxed);
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.events_dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn snapshot(&self) -> TracingMetrics {
        let events_flushed = self.events_flushed.load(Ordering::Acquire);
        TracingMetrics {
            events_recorded: self.events_recorded.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_flushed,
            flushes: self.flushes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            args_truncated: self.args_truncated.load(Ordering::Relaxed),
        }
    }
}
