//! Low-overhead Chrome trace event recorder for OpenRacing
//!
//! Records timestamped begin/end/instant/counter events from any thread and
//! writes them as a `{"traceEvents": [...]}` JSON document that loads in
//! `chrome://tracing`, Perfetto and similar viewers.
//!
//! # Architecture
//!
//! - Two fixed-capacity buffers alternate between accepting events and being
//!   flushed. Recording reserves a slot under an O(1) lock and fills it after
//!   the lock is released.
//! - [`ChromeTracer::flush`] swaps the buffers and serializes the full one
//!   while recording continues into the other.
//! - A [`FlushWorker`] can flush on a timer; [`ChromeTracer::close`] flushes
//!   the remainder and terminates the document.
//!
//! # Failure behavior
//!
//! Recording never fails and never blocks beyond the slot reservation. Events
//! recorded after `close`, or while the active buffer is full, are dropped
//! (the latter are counted in [`TracingMetrics::events_dropped`]). A crash
//! before `close` leaves a truncated, unterminated file.
//!
//! # Example
//!
//! ```rust,no_run
//! use openracing_chrome_trace::{ChromeTracer, TracingError, trace_begin, trace_end};
//!
//! let tracer = ChromeTracer::init("trace.json")?;
//!
//! trace_begin!(tracer, "net", "connect");
//! trace_end!(tracer, "net", "connect");
//! tracer.counter("net", "sockets", "queue_depth", 42);
//!
//! tracer.close()?;
//! # Ok::<(), TracingError>(())
//! ```

#![deny(unsafe_op_in_unsafe_fn, clippy::unwrap_used)]
#![warn(missing_docs, missing_debug_implementations)]
#![cfg_attr(docsrs, feature(doc_cfg))]

mod buffer;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod macros;
pub mod metrics;
pub mod platform;
pub mod prelude;
pub mod sink;
pub mod tracer;
pub mod worker;

pub use config::TraceConfig;
pub use error::TracingError;
pub use events::{EventRecord, Phase, TraceArg};
pub use metrics::TracingMetrics;
pub use platform::{IdentitySource, SystemIdentity};
pub use sink::{FileSink, MemorySink, TraceSink};
pub use tracer::ChromeTracer;
pub use worker::FlushWorker;
