//! Trace recorder error types

use core::fmt;

/// Errors surfaced by tracer construction, flushing and shutdown.
///
/// Recording never returns an error: a closed tracer or a full buffer
/// silently drops the event and counts it in [`TracingMetrics`](crate::TracingMetrics).
#[derive(Debug, thiserror::Error)]
pub enum TracingError {
    /// A required argument was missing or empty
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Invalid configuration
    #[error("Invalid tracing configuration: {0}")]
    InvalidConfiguration(String),

    /// Event buffers could not be allocated
    #[error("Trace resources exhausted: {0}")]
    ResourceExhausted(String),

    /// Sink open, write, sync or close failure
    #[error("Trace sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink accepted part of a write and then failed, leaving a partial
    /// event in the output
    #[error("Trace output corrupted: {0}")]
    Corrupted(String),

    /// Background flush thread could not be started
    #[error("Failed to spawn flush worker: {0}")]
    WorkerSpawn(String),
}

impl TracingError {
    /// Check if this error is recoverable
    ///
    /// I/O failures that left the sink untouched may be transient and a later
    /// flush can succeed. A corrupted document stays broken, and everything
    /// else requires a configuration change.
    pub fn is_recoverable(&self) -> bool {
        match self {
            TracingError::Io(_) => true,
            TracingError::WorkerSpawn(_) => true,
            TracingError::InvalidArgument(_) => false,
            TracingError::InvalidConfiguration(_) => false,
            TracingError::ResourceExhausted(_) => false,
            TracingError::Corrupted(_) => false,
        }
    }

    /// Create an invalid argument error with context
    pub fn invalid_argument(context: impl fmt::Display) -> Self {
        TracingError::InvalidArgument(context.to_string())
    }

    /// Create an invalid configuration error with context
    pub fn invalid_config(context: impl fmt::Display) -> Self {
        TracingError::InvalidConfiguration(context.to_string())
    }

    /// Create a resource exhaustion error with context
    pub fn exhausted(context: impl fmt::Display) -> Self {
        TracingError::ResourceExhausted(context.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_recoverable() {
        let io = TracingError::from(std::io::Error::other("disk full"));
        assert!(io.is_recoverable());
        assert!(!TracingError::invalid_argument("no path").is_recoverable());
        assert!(!TracingError::exhausted("oom").is_recoverable());
        assert!(!TracingError::Corrupted("partial write".into()).is_recoverable());
    }

    #[test]
    fn test_error_constructors() {
        let e = TracingError::invalid_argument("output path");
        assert!(matches!(e, TracingError::InvalidArgument(_)));

        let e = TracingError::invalid_config("capacity");
        assert!(matches!(e, TracingError::InvalidConfiguration(_)));

        let e = TracingError::exhausted("buffers");
        assert!(matches!(e, TracingError::ResourceExhausted(_)));
    }

    #[test]
    fn test_error_display() {
        let e = TracingError::from(std::io::Error::new(
            std::io::ErrorKind::PermissionDenied,
            "trace.json",
        ));
        let s = e.to_string();
        assert!(s.contains("trace.json"));
        assert!(s.starts_with("Trace sink I/O error"));
    }
}
