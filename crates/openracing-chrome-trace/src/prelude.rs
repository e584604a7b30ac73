//! Prelude for openracing-chrome-trace
//!
//! This module re-exports the most commonly used types and macros.
//!
//! # Example
//!
//! ```rust,ignore
//! use openracing_chrome_trace::prelude::*;
//!
//! let tracer = ChromeTracer::init("trace.json")?;
//! trace_instant!(tracer, "app", "started");
//! ```

pub use crate::{
    ChromeTracer, FlushWorker, Phase, TraceArg, TraceConfig, TracingError, TracingMetrics,
    trace_begin, trace_counter, trace_end, trace_instant, trace_instant_str,
};
