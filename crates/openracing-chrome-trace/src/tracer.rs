//! Chrome trace recorder
//!
//! [`ChromeTracer`] owns the double buffer, the output sink and the counters
//! for one trace file. Share it by reference or `Arc` with every thread that
//! records events.

use crate::buffer::{DualBuffer, Epoch, Reservation};
use crate::format::{self, CLOSING, PREAMBLE, SEPARATOR};
use crate::metrics::AtomicMetrics;
use crate::platform::{IdentitySource, SystemIdentity};
use crate::sink::{FileSink, TraceSink};
use crate::{EventRecord, Phase, TraceArg, TraceConfig, TracingError, TracingMetrics};
use parking_lot::Mutex;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Serialized events are handed to the sink in chunks of about this size
const WRITE_CHUNK: usize = 64 * 1024;

/// Double-buffered Chrome trace event recorder
///
/// # Recording
///
/// [`record`](Self::record) and its helpers reserve a slot in the active
/// buffer under a short O(1) critical section, then capture the timestamp and
/// thread identity and store the event with that lock released. Recording
/// never fails: a closed tracer ignores the call and a full buffer drops the
/// event and counts it in [`TracingMetrics::events_dropped`].
///
/// # Flushing
///
/// [`flush`](Self::flush) swaps the active and flushing buffers, then writes
/// every event of the old active buffer to the sink while recorders keep
/// filling the new one. Concurrent flushes are serialized internally.
///
/// # Example
///
/// ```rust,no_run
/// use openracing_chrome_trace::{ChromeTracer, TracingError};
///
/// let tracer = ChromeTracer::init("trace.json")?;
/// tracer.begin("net", "connect");
/// tracer.end("net", "connect");
/// tracer.counter("net", "sockets", "queue_depth", 42);
/// tracer.close()?;
/// # Ok::<(), TracingError>(())
/// ```
pub struct ChromeTracer {
    buffer: DualBuffer,
    open: AtomicBool,
    identity: Box<dyn IdentitySource>,
    flusher: Mutex<Flusher>,
    metrics: AtomicMetrics,
    config: TraceConfig,
}

/// State owned by the flush path
struct Flusher {
    sink: Option<Box<dyn TraceSink>>,
    scratch: String,
    scratch_events: u64,
    events_written: u64,
    drops_reported: u64,
    max_copied_arg_chars: usize,
    sync_on_flush: bool,
    /// Set once a write failed after the sink accepted part of it
    poisoned: bool,
}

impl ChromeTracer {
    /// Start tracing to `output_path` with default settings
    ///
    /// # Errors
    ///
    /// See [`with_config`](Self::with_config).
    pub fn init(output_path: impl AsRef<Path>) -> Result<Self, TracingError> {
        Self::with_config(TraceConfig::new(output_path))
    }

    /// Start tracing to the file named by `config`
    ///
    /// Creates (or truncates) the file, allocates both buffers and writes the
    /// JSON preamble.
    ///
    /// # Errors
    ///
    /// - [`TracingError::InvalidArgument`] if no output path is configured
    /// - [`TracingError::InvalidConfiguration`] for out-of-range limits
    /// - [`TracingError::ResourceExhausted`] if the buffers cannot be allocated
    /// - [`TracingError::Io`] if the file cannot be created or written
    pub fn with_config(config: TraceConfig) -> Result<Self, TracingError> {
        let path = config.validate()?.to_path_buf();
        let sink = FileSink::create(&path)?;
        let buffer = DualBuffer::with_capacity(config.capacity)?;
        let tracer = Self::assemble(config, buffer, Box::new(sink))?;
        tracing::info!(
            path = %path.display(),
            capacity = tracer.buffer.capacity(),
            "Chrome trace recording started"
        );
        Ok(tracer)
    }

    /// Start tracing to a caller-supplied sink
    ///
    /// `config.output_path` is ignored.
    ///
    /// # Errors
    ///
    /// Same as [`with_config`](Self::with_config) apart from the path check.
    pub fn with_sink(
        config: TraceConfig,
        sink: impl TraceSink + 'static,
    ) -> Result<Self, TracingError> {
        config.validate_limits()?;
        let buffer = DualBuffer::with_capacity(config.capacity)?;
        Self::assemble(config, buffer, Box::new(sink))
    }

    /// Replace the timestamp and thread identity source
    #[must_use]
    pub fn with_identity(mut self, identity: impl IdentitySource + 'static) -> Self {
        self.identity = Box::new(identity);
        self
    }

    fn assemble(
        config: TraceConfig,
        buffer: DualBuffer,
        mut sink: Box<dyn TraceSink>,
    ) -> Result<Self, TracingError> {
        sink.write_all(PREAMBLE.as_bytes())?;
        sink.flush()?;

        let metrics = AtomicMetrics::default();
        metrics.add_bytes(PREAMBLE.len());

        Ok(Self {
            buffer,
            open: AtomicBool::new(true),
            identity: Box::new(SystemIdentity::new()),
            flusher: Mutex::new(Flusher {
                sink: Some(sink),
                scratch: String::new(),
                scratch_events: 0,
                events_written: 0,
                drops_reported: 0,
                max_copied_arg_chars: config.max_copied_arg_chars,
                sync_on_flush: config.sync_on_flush,
                poisoned: false,
            }),
            metrics,
            config,
        })
    }

    /// Record an event
    ///
    /// Silently ignored once the tracer is closed or while the active buffer
    /// is full.
    #[inline]
    pub fn record(
        &self,
        category: &'static str,
        name: &'static str,
        phase: Phase,
        arg: TraceArg,
    ) {
        self.record_with(category, name, phase, || arg);
    }

    /// Record an event with an owned copy of a string argument
    ///
    /// The copy is made only after a slot has been reserved, so a closed or
    /// full tracer does not allocate.
    #[inline]
    pub fn record_copy(
        &self,
        category: &'static str,
        name: &'static str,
        phase: Phase,
        arg_name: &'static str,
        value: &str,
    ) {
        self.record_with(category, name, phase, || TraceArg::str_copy(arg_name, value));
    }

    /// Record a duration begin (`B`) event
    #[inline]
    pub fn begin(&self, category: &'static str, name: &'static str) {
        self.record(category, name, Phase::Begin, TraceArg::None);
    }

    /// Record a duration end (`E`) event
    #[inline]
    pub fn end(&self, category: &'static str, name: &'static str) {
        self.record(category, name, Phase::End, TraceArg::None);
    }

    /// Record an instant (`I`) event
    #[inline]
    pub fn instant(&self, category: &'static str, name: &'static str) {
        self.record(category, name, Phase::Instant, TraceArg::None);
    }

    /// Record an instant event carrying a `'static` string argument
    #[inline]
    pub fn instant_str(
        &self,
        category: &'static str,
        name: &'static str,
        arg_name: &'static str,
        value: &'static str,
    ) {
        self.record(category, name, Phase::Instant, TraceArg::str_const(arg_name, value));
    }

    /// Record a counter (`C`) sample
    #[inline]
    pub fn counter(
        &self,
        category: &'static str,
        name: &'static str,
        arg_name: &'static str,
        value: i64,
    ) {
        self.record(category, name, Phase::Counter, TraceArg::int(arg_name, value));
    }

    #[inline]
    fn record_with(
        &self,
        category: &'static str,
        name: &'static str,
        phase: Phase,
        arg: impl FnOnce() -> TraceArg,
    ) {
        if !self.open.load(Ordering::Relaxed) {
            return;
        }

        match self.buffer.reserve() {
            Reservation::Reserved(mut slot) => {
                *slot = Some(EventRecord {
                    category,
                    name,
                    phase,
                    timestamp_us: self.identity.timestamp_us(),
                    process_id: self.identity.process_id(),
                    thread_id: self.identity.thread_id(),
                    arg: arg(),
                });
                self.metrics.inc_recorded();
                drop(slot);
            }
            Reservation::Full => {
                self.metrics.inc_dropped();
            }
            Reservation::Closed => {}
        }
    }

    /// Write every buffered event to the sink
    ///
    /// A no-op returning `Ok(())` after [`close`](Self::close).
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::Io`] if writing, flushing or syncing the sink
    /// fails. The drained events are discarded in that case.
    ///
    /// Returns [`TracingError::Corrupted`] if the sink accepted part of a
    /// write before failing. The document can no longer be completed, so
    /// every later flush drains and discards its events and returns the
    /// same error.
    pub fn flush(&self) -> Result<(), TracingError> {
        let mut flusher = self.flusher.lock();
        let Some(epoch) = self.buffer.swap(false) else {
            return Ok(());
        };
        self.write_epoch(&mut flusher, epoch)
    }

    /// Flush remaining events, terminate the JSON document and close the sink
    ///
    /// Recording stops atomically with the final buffer swap. Later calls to
    /// `record` are ignored and later calls to `flush` or `close` return
    /// `Ok(())` without doing anything.
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::Io`] if the final write or sync fails, or
    /// [`TracingError::Corrupted`] if an earlier partial write broke the
    /// document. The sink is synced and released and the tracer is closed
    /// regardless.
    pub fn close(&self) -> Result<(), TracingError> {
        let mut flusher = self.flusher.lock();
        let Some(epoch) = self.buffer.swap(true) else {
            return Ok(());
        };
        self.open.store(false, Ordering::Relaxed);

        let drained = self.write_epoch(&mut flusher, epoch);
        let finished = flusher.finish(&self.metrics);

        let metrics = self.metrics.snapshot();
        tracing::info!(
            events = metrics.events_flushed,
            dropped = metrics.events_dropped,
            bytes = metrics.bytes_written,
            "Chrome trace recording closed"
        );

        drained?;
        finished
    }

    fn write_epoch(&self, flusher: &mut Flusher, epoch: Epoch) -> Result<(), TracingError> {
        let written_before = flusher.events_written;
        let mut truncated = 0u64;
        let mut result = flusher.check_intact();

        for record in self.buffer.drain(epoch) {
            // Keep draining after a failure so every slot is released.
            if result.is_err() {
                continue;
            }
            match flusher.append(&record, &self.metrics) {
                Ok(cut) => truncated = truncated.saturating_add(u64::from(cut)),
                Err(e) => result = Err(e),
            }
        }

        let result = result.and_then(|()| flusher.commit(&self.metrics));
        let written = flusher.events_written.saturating_sub(written_before);

        self.metrics.add_flushed(written);
        self.metrics.add_truncated(truncated);
        self.metrics.inc_flushes();

        let dropped = self.metrics.dropped();
        if dropped > flusher.drops_reported {
            tracing::warn!(
                dropped = dropped.saturating_sub(flusher.drops_reported),
                capacity = self.buffer.capacity(),
                "Trace buffer full, events dropped"
            );
            flusher.drops_reported = dropped;
        }

        tracing::debug!(events = written, requested = epoch.len(), "Flushed trace epoch");
        result
    }

    /// Snapshot of recorder counters
    pub fn metrics(&self) -> TracingMetrics {
        self.metrics.snapshot()
    }

    /// Configuration the tracer was built with
    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Records each of the two buffers can hold
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Events reserved in the active buffer since the last flush
    pub fn pending(&self) -> usize {
        self.buffer.pending()
    }

    /// Returns true until [`close`](Self::close) is called
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Relaxed)
    }
}

impl Flusher {
    fn check_intact(&self) -> Result<(), TracingError> {
        if self.poisoned {
            return Err(poisoned_error());
        }
        Ok(())
    }

    /// Serialize one record into the scratch buffer
    fn append(
        &mut self,
        record: &EventRecord,
        metrics: &AtomicMetrics,
    ) -> Result<bool, TracingError> {
        if self.events_written > 0 || self.scratch_events > 0 {
            self.scratch.push_str(SEPARATOR);
        }
        let truncated = format::write_event(&mut self.scratch, record, self.max_copied_arg_chars)
            .map_err(io::Error::other)?;
        self.scratch_events = self.scratch_events.saturating_add(1);

        if self.scratch.len() >= WRITE_CHUNK {
            self.write_scratch(metrics)?;
        }
        Ok(truncated)
    }

    /// Write out the scratch buffer, then flush and optionally sync the sink
    fn commit(&mut self, metrics: &AtomicMetrics) -> Result<(), TracingError> {
        self.write_scratch(metrics)?;
        let sink = self.sink()?;
        sink.flush()?;
        if self.sync_on_flush {
            self.sink()?.sync()?;
        }
        Ok(())
    }

    fn write_scratch(&mut self, metrics: &AtomicMetrics) -> Result<(), TracingError> {
        if self.scratch.is_empty() {
            return Ok(());
        }
        let outcome = match self.sink.as_mut() {
            Some(sink) => write_counted(sink.as_mut(), self.scratch.as_bytes()),
            None => Err((0, closed_sink())),
        };
        let result = match outcome {
            Ok(()) => {
                metrics.add_bytes(self.scratch.len());
                self.events_written = self.events_written.saturating_add(self.scratch_events);
                Ok(())
            }
            Err((accepted, e)) => {
                metrics.add_bytes(accepted);
                Err(self.write_failed(accepted, e))
            }
        };
        self.scratch.clear();
        self.scratch_events = 0;
        result
    }

    /// Classify a failed write; any accepted bytes leave a partial object behind
    fn write_failed(&mut self, accepted: usize, error: io::Error) -> TracingError {
        if accepted == 0 {
            return TracingError::Io(error);
        }
        self.poisoned = true;
        tracing::error!(
            accepted,
            error = %error,
            "Partial trace write, output document is corrupted"
        );
        TracingError::Corrupted(format!("sink failed after accepting {accepted} bytes: {error}"))
    }

    /// Terminate the document, sync and release the sink
    ///
    /// A poisoned document is not terminated, but the sink is still synced.
    fn finish(&mut self, metrics: &AtomicMetrics) -> Result<(), TracingError> {
        self.scratch.clear();
        self.scratch_events = 0;
        let Some(mut sink) = self.sink.take() else {
            return Ok(());
        };

        let mut result = self.check_intact();
        if result.is_ok() {
            if let Err((accepted, e)) = write_counted(sink.as_mut(), CLOSING.as_bytes()) {
                metrics.add_bytes(accepted);
                result = Err(self.write_failed(accepted, e));
            } else {
                metrics.add_bytes(CLOSING.len());
            }
        }

        let synced = sink.flush().and_then(|()| sink.sync());
        result?;
        synced.map_err(TracingError::from)
    }

    fn sink(&mut self) -> io::Result<&mut Box<dyn TraceSink>> {
        self.sink.as_mut().ok_or_else(closed_sink)
    }
}

/// Write all of `bytes`, reporting how many the sink accepted before an error
fn write_counted(sink: &mut dyn TraceSink, mut bytes: &[u8]) -> Result<(), (usize, io::Error)> {
    let mut accepted = 0usize;
    while !bytes.is_empty() {
        match sink.write(bytes) {
            Ok(0) => return Err((accepted, io::ErrorKind::WriteZero.into())),
            Ok(n) => {
                accepted = accepted.saturating_add(n);
                bytes = bytes.get(n..).unwrap_or_default();
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err((accepted, e)),
        }
    }
    Ok(())
}

fn closed_sink() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "trace sink already closed")
}

fn poisoned_error() -> TracingError {
    TracingError::Corrupted("an earlier partial write left the document incomplete".into())
}

impl Drop for ChromeTracer {
    fn drop(&mut self) {
        if self.buffer.is_open() {
            tracing::debug!("ChromeTracer dropped while open, closing");
            if let Err(e) = self.close() {
                tracing::warn!(error = %e, "Failed to close trace on drop");
            }
        }
    }
}

impl core::fmt::Debug for ChromeTracer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ChromeTracer")
            .field("buffer", &self.buffer)
            .field("open", &self.is_open())
            .field("config", &self.config)
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}
