//! Periodic background flushing

use crate::{ChromeTracer, TracingError};
use core::time::Duration;
use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Thread that flushes a [`ChromeTracer`] at a fixed interval
///
/// Recoverable flush failures are logged and the loop keeps running; the
/// next flush may succeed. The thread exits when the worker is stopped or
/// dropped, after the tracer has been closed, or once the output document
/// is corrupted.
#[derive(Debug)]
pub struct FlushWorker {
    stop_tx: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
    interval: Duration,
}

impl FlushWorker {
    /// Start flushing `tracer` every `interval`
    ///
    /// # Errors
    ///
    /// Returns [`TracingError::InvalidConfiguration`] for a zero interval and
    /// [`TracingError::WorkerSpawn`] if the thread cannot be created.
    pub fn spawn(tracer: Arc<ChromeTracer>, interval: Duration) -> Result<Self, TracingError> {
        if interval.is_zero() {
            return Err(TracingError::invalid_config(
                "flush interval must be non-zero",
            ));
        }

        let (stop_tx, stop_rx) = channel::bounded(1);
        let handle = thread::Builder::new()
            .name("chrome-trace-flush".to_string())
            .spawn(move || flush_loop(&tracer, &stop_rx, interval))
            .map_err(|e| TracingError::WorkerSpawn(e.to_string()))?;

        tracing::debug!(interval = ?interval, "Trace flush worker started");

        Ok(Self {
            stop_tx: Some(stop_tx),
            handle: Some(handle),
            interval,
        })
    }

    /// Flush period
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Returns true while the flush thread is alive
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Signal the thread to stop and wait for it
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        // Disconnecting the channel wakes the thread immediately.
        drop(self.stop_tx.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Trace flush worker panicked");
            }
        }
    }
}

impl Drop for FlushWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn flush_loop(tracer: &ChromeTracer, stop_rx: &Receiver<()>, interval: Duration) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {
                if !tracer.is_open() {
                    break;
                }
                match tracer.flush() {
                    Ok(()) => {}
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!(error = %e, "Background trace flush failed");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Background trace flushing stopped");
                        break;
                    }
                }
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::debug!("Trace flush worker stopped");
}

impl ChromeTracer {
    /// Start a [`FlushWorker`] using the configured `flush_interval_ms`
    ///
    /// Returns `Ok(None)` when no interval is configured.
    ///
    /// # Errors
    ///
    /// See [`FlushWorker::spawn`].
    pub fn spawn_flush_worker(self: &Arc<Self>) -> Result<Option<FlushWorker>, TracingError> {
        self.config()
            .flush_interval()
            .map(|interval| FlushWorker::spawn(Arc::clone(self), interval))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TraceConfig;
    use crate::sink::MemorySink;
    use std::time::Instant;

    fn memory_tracer(config: TraceConfig) -> Result<(Arc<ChromeTracer>, MemorySink), TracingError> {
        let sink = MemorySink::new();
        let tracer = ChromeTracer::with_sink(config.with_capacity(16), sink.clone())?;
        Ok((Arc::new(tracer), sink))
    }

    fn wait_for(deadline: Duration, mut done: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if done() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        done()
    }

    #[test]
    fn test_worker_flushes_periodically() -> Result<(), TracingError> {
        let (tracer, sink) = memory_tracer(TraceConfig::default())?;
        let worker = FlushWorker::spawn(Arc::clone(&tracer), Duration::from_millis(10))?;
        assert!(worker.is_running());
        assert_eq!(worker.interval(), Duration::from_millis(10));

        tracer.instant("worker", "tick");
        let flushed = wait_for(Duration::from_secs(5), || {
            sink.contents().contains("\"name\":\"tick\"")
        });
        assert!(flushed);

        worker.stop();
        tracer.close()?;
        Ok(())
    }

    #[test]
    fn test_worker_exits_after_close() -> Result<(), TracingError> {
        let (tracer, _sink) = memory_tracer(TraceConfig::default())?;
        let worker = FlushWorker::spawn(Arc::clone(&tracer), Duration::from_millis(5))?;

        tracer.close()?;
        assert!(wait_for(Duration::from_secs(5), || !worker.is_running()));
        Ok(())
    }

    #[test]
    fn test_zero_interval_rejected() -> Result<(), TracingError> {
        let (tracer, _sink) = memory_tracer(TraceConfig::default())?;
        let result = FlushWorker::spawn(tracer, Duration::ZERO);
        assert!(matches!(result, Err(TracingError::InvalidConfiguration(_))));
        Ok(())
    }

    #[test]
    fn test_spawn_from_config() -> Result<(), TracingError> {
        let (tracer, _sink) = memory_tracer(TraceConfig::default())?;
        assert!(tracer.spawn_flush_worker()?.is_none());

        let config = TraceConfig::default().with_flush_interval(Duration::from_millis(20));
        let (tracer, _sink) = memory_tracer(config)?;
        let worker = tracer.spawn_flush_worker()?;
        assert_eq!(
            worker.as_ref().map(FlushWorker::interval),
            Some(Duration::from_millis(20))
        );
        Ok(())
    }
}
