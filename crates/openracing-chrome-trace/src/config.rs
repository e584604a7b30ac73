//! Tracer configuration

use crate::TracingError;
use core::time::Duration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default number of records each of the two buffers can hold
pub const DEFAULT_CAPACITY: usize = 1_000_000;

/// Default maximum length, in characters, of an emitted copied string argument
pub const DEFAULT_MAX_COPIED_ARG_CHARS: usize = 300;

/// Chrome trace recorder configuration
///
/// Deserializes with defaults for every missing field, so a config file only
/// needs to name the output path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceConfig {
    /// Trace file to create (truncated if it exists)
    pub output_path: Option<PathBuf>,
    /// Records per buffer; the tracer allocates two buffers of this size
    pub capacity: usize,
    /// Copied string arguments longer than this are cut on output
    pub max_copied_arg_chars: usize,
    /// Call `sync_data` on the sink after every flush; `close` always syncs
    pub sync_on_flush: bool,
    /// Background flush period in milliseconds, `None` for explicit flushes only
    pub flush_interval_ms: Option<u64>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            output_path: None,
            capacity: DEFAULT_CAPACITY,
            max_copied_arg_chars: DEFAULT_MAX_COPIED_ARG_CHARS,
            sync_on_flush: true,
            flush_interval_ms: None,
        }
    }
}

impl TraceConfig {
    /// Create a configuration writing to `output_path` with defaults
    pub fn new(output_path: impl AsRef<Path>) -> Self {
        Self {
            output_path: Some(output_path.as_ref().to_path_buf()),
            ..Self::default()
        }
    }

    /// Set the per-buffer capacity
    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Set the copied string argument limit
    #[must_use]
    pub fn with_max_copied_arg_chars(mut self, max_chars: usize) -> Self {
        self.max_copied_arg_chars = max_chars;
        self
    }

    /// Enable or disable `sync_data` after each flush
    #[must_use]
    pub fn with_sync_on_flush(mut self, sync: bool) -> Self {
        self.sync_on_flush = sync;
        self
    }

    /// Set the background flush interval
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval_ms = Some(u64::try_from(interval.as_millis()).unwrap_or(u64::MAX));
        self
    }

    /// Background flush interval, if configured
    pub fn flush_interval(&self) -> Option<Duration> {
        self.flush_interval_ms.map(Duration::from_millis)
    }

    /// Validate limits that do not depend on the output path
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::InvalidConfiguration`] for a zero capacity, a
    /// zero string limit or a zero flush interval.
    pub fn validate_limits(&self) -> Result<(), TracingError> {
        if self.capacity == 0 {
            return Err(TracingError::invalid_config("capacity must be non-zero"));
        }
        if self.max_copied_arg_chars == 0 {
            return Err(TracingError::invalid_config(
                "max_copied_arg_chars must be non-zero",
            ));
        }
        if self.flush_interval_ms == Some(0) {
            return Err(TracingError::invalid_config(
                "flush_interval_ms must be non-zero",
            ));
        }
        Ok(())
    }

    /// Validate the full configuration and return the output path
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::InvalidArgument`] when no output path is set or
    /// it is empty, otherwise whatever [`validate_limits`](Self::validate_limits)
    /// reports.
    pub fn validate(&self) -> Result<&Path, TracingError> {
        let path = match self.output_path.as_deref() {
            Some(path) if !path.as_os_str().is_empty() => path,
            _ => return Err(TracingError::invalid_argument("output path is required")),
        };
        self.validate_limits()?;
        Ok(path)
    }
}
