//! Call-site macros for trace event recording
//!
//! Each macro takes a tracer expression (anything that derefs to
//! [`ChromeTracer`](crate::ChromeTracer)). When the crate is built without the
//! `enabled` feature every macro expands to a no-op that only borrows the
//! tracer expression, so instrumented code compiles unchanged.

/// Record a duration begin event
///
/// # Example
///
/// ```rust,ignore
/// use openracing_chrome_trace::{ChromeTracer, trace_begin};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// trace_begin!(tracer, "hid", "write_report");
/// ```
#[cfg(feature = "enabled")]
#[macro_export]
macro_rules! trace_begin {
    ($tracer:expr, $category:expr, $name:expr) => {
        $tracer.begin($category, $name)
    };
}

/// Record a duration end event
///
/// # Example
///
/// ```rust,ignore
/// use openracing_chrome_trace::{ChromeTracer, trace_end};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// trace_end!(tracer, "hid", "write_report");
/// ```
#[cfg(feature = "enabled")]
#[macro_export]
macro_rules! trace_end {
    ($tracer:expr, $category:expr, $name:expr) => {
        $tracer.end($category, $name)
    };
}

/// Record an instant event
///
/// # Example
///
/// ```rust,ignore
/// use openracing_chrome_trace::{ChromeTracer, trace_instant};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// trace_instant!(tracer, "safety", "fault_latched");
/// ```
#[cfg(feature = "enabled")]
#[macro_export]
macro_rules! trace_instant {
    ($tracer:expr, $category:expr, $name:expr) => {
        $tracer.instant($category, $name)
    };
}

/// Record an instant event with a string argument
///
/// A `'static` string literal is stored by reference; use the `copy` form for
/// strings that do not outlive the call.
///
/// # Example
///
/// ```rust,ignore
/// use openracing_chrome_trace::{ChromeTracer, trace_instant_str};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// trace_instant_str!(tracer, "device", "connected", "model", "Alpha Mini");
/// trace_instant_str!(tracer, "device", "connected", "path", copy &device_path);
/// ```
#[cfg(feature = "enabled")]
#[macro_export]
macro_rules! trace_instant_str {
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, copy $value:expr) => {
        $tracer.record_copy(
            $category,
            $name,
            $crate::Phase::Instant,
            $arg_name,
            $value,
        )
    };
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, $value:expr) => {
        $tracer.instant_str($category, $name, $arg_name, $value)
    };
}

/// Record a counter sample
///
/// # Example
///
/// ```rust,ignore
/// use openracing_chrome_trace::{ChromeTracer, trace_counter};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// trace_counter!(tracer, "rt", "queue", "queue_depth", 42);
/// ```
#[cfg(feature = "enabled")]
#[macro_export]
macro_rules! trace_counter {
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, $value:expr) => {
        $tracer.counter($category, $name, $arg_name, ::core::primitive::i64::from($value))
    };
}

#[cfg(not(feature = "enabled"))]
#[macro_export]
macro_rules! trace_begin {
    ($tracer:expr, $category:expr, $name:expr) => {{
        let _ = &$tracer;
    }};
}

#[cfg(not(feature = "enabled"))]
#[macro_export]
macro_rules! trace_end {
    ($tracer:expr, $category:expr, $name:expr) => {{
        let _ = &$tracer;
    }};
}

#[cfg(not(feature = "enabled"))]
#[macro_export]
macro_rules! trace_instant {
    ($tracer:expr, $category:expr, $name:expr) => {{
        let _ = &$tracer;
    }};
}

#[cfg(not(feature = "enabled"))]
#[macro_export]
macro_rules! trace_instant_str {
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, copy $value:expr) => {{
        let _ = &$tracer;
    }};
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, $value:expr) => {{
        let _ = &$tracer;
    }};
}

#[cfg(not(feature = "enabled"))]
#[macro_export]
macro_rules! trace_counter {
    ($tracer:expr, $category:expr, $name:expr, $arg_name:expr, $value:expr) => {{
        let _ = &$tracer;
    }};
}

#[cfg(all(test, feature = "enabled"))]
mod tests {
    use crate::sink::MemorySink;
    use crate::{ChromeTracer, TraceConfig, TracingError};

    #[test]
    fn test_trace_macros() -> Result<(), TracingError> {
        let sink = MemorySink::new();
        let tracer = ChromeTracer::with_sink(TraceConfig::default().with_capacity(16), sink.clone())?;
        let device_path = String::from("/dev/hidraw3");

        trace_begin!(tracer, "hid", "write");
        trace_end!(tracer, "hid", "write");
        trace_instant!(tracer, "safety", "fault");
        trace_instant_str!(tracer, "device", "connected", "model", "Alpha");
        trace_instant_str!(tracer, "device", "connected", "path", copy &device_path);
        trace_counter!(tracer, "rt", "queue", "queue_depth", 42u32);

        assert_eq!(tracer.metrics().events_recorded, 6);
        tracer.close()?;

        let contents = sink.contents();
        assert!(contents.contains(r#""args":{"model":"Alpha"}"#));
        assert!(contents.contains(r#""args":{"path":"/dev/hidraw3"}"#));
        assert!(contents.contains(r#""args":{"queue_depth":42}"#));
        Ok(())
    }

    #[test]
    fn test_macros_accept_shared_tracer() -> Result<(), TracingError> {
        let tracer = std::sync::Arc::new(ChromeTracer::with_sink(
            TraceConfig::default().with_capacity(4),
            MemorySink::new(),
        )?);
        let shared = std::sync::Arc::clone(&tracer);

        std::thread::spawn(move || trace_instant!(shared, "thread", "spawned"))
            .join()
            .map_err(|_| TracingError::WorkerSpawn("recording thread panicked".into()))?;

        assert_eq!(tracer.metrics().events_recorded, 1);
        Ok(())
    }
}

#[cfg(all(test, not(feature = "enabled")))]
mod disabled_tests {
    use crate::sink::MemorySink;
    use crate::{ChromeTracer, TraceConfig, TracingError};

    #[test]
    fn test_disabled_macros_only_borrow_tracer() -> Result<(), TracingError> {
        let sink = MemorySink::new();
        let tracer = ChromeTracer::with_sink(TraceConfig::default().with_capacity(4), sink.clone())?;
        let device_path = String::from("/dev/hidraw3");

        trace_begin!(tracer, "hid", "write");
        trace_end!(tracer, "hid", "write");
        trace_instant!(tracer, "safety", "fault");
        trace_instant_str!(tracer, "device", "connected", "model", "Alpha");
        trace_instant_str!(tracer, "device", "connected", "path", copy &device_path);
        trace_counter!(tracer, "rt", "queue", "queue_depth", 42u32);

        assert_eq!(device_path, "/dev/hidraw3");
        assert_eq!(tracer.metrics().events_recorded, 0);
        assert_eq!(tracer.pending(), 0);
        tracer.close()?;
        assert_eq!(sink.contents(), "{\"traceEvents\": [\n\n]}\n");
        Ok(())
    }
}
