//! Snapshot tests for openracing-chrome-trace output formats

use openracing_chrome_trace::format::write_event;
use openracing_chrome_trace::{
    ChromeTracer, EventRecord, IdentitySource, MemorySink, Phase, TraceArg, TraceConfig,
    TracingError, TracingMetrics,
};
use std::sync::atomic::{AtomicU64, Ordering};

struct StepClock(AtomicU64);

impl IdentitySource for StepClock {
    fn timestamp_us(&self) -> u64 {
        self.0.fetch_add(250, Ordering::Relaxed)
    }

    fn process_id(&self) -> i32 {
        1234
    }

    fn thread_id(&self) -> u64 {
        5678
    }
}

fn record(phase: Phase, arg: TraceArg) -> EventRecord {
    EventRecord {
        category: "hid",
        name: "write_report",
        phase,
        timestamp_us: 1_000_250,
        process_id: 1234,
        thread_id: 5678,
        arg,
    }
}

fn render(record: &EventRecord) -> String {
    let mut out = String::new();
    match write_event(&mut out, record, 300) {
        Ok(_) => out,
        Err(e) => e.to_string(),
    }
}

#[test]
fn test_begin_event_snapshot() {
    insta::assert_snapshot!(
        render(&record(Phase::Begin, TraceArg::None)),
        @r#"{"cat":"hid","pid":1234,"tid":5678,"ts":1000250,"ph":"B","name":"write_report"}"#
    );
}

#[test]
fn test_counter_event_snapshot() {
    insta::assert_snapshot!(
        render(&record(Phase::Counter, TraceArg::int("queue_depth", -3))),
        @r#"{"cat":"hid","pid":1234,"tid":5678,"ts":1000250,"ph":"C","name":"write_report","args":{"queue_depth":-3}}"#
    );
}

#[test]
fn test_string_event_snapshot() {
    insta::assert_snapshot!(
        render(&record(Phase::Instant, TraceArg::str_const("model", "Alpha Mini"))),
        @r#"{"cat":"hid","pid":1234,"tid":5678,"ts":1000250,"ph":"I","name":"write_report","args":{"model":"Alpha Mini"}}"#
    );
}

#[test]
fn test_record_display_snapshot() {
    insta::assert_snapshot!(
        record(Phase::End, TraceArg::None).to_string(),
        @"hid:write_report(E, ts=1000250us, pid=1234, tid=5678)"
    );
}

#[test]
fn test_metrics_display_snapshot() {
    let metrics = TracingMetrics {
        events_recorded: 990,
        events_dropped: 10,
        events_flushed: 900,
        flushes: 3,
        bytes_written: 81_920,
        args_truncated: 2,
    };
    insta::assert_snapshot!(
        metrics.to_string(),
        @"TracingMetrics(recorded=990, dropped=10, flushed=900, flushes=3, bytes=81920, truncated=2, drop_rate=1.0000%)"
    );
}

#[test]
fn test_document_snapshot() -> Result<(), TracingError> {
    let sink = MemorySink::new();
    let tracer = ChromeTracer::with_sink(TraceConfig::default().with_capacity(8), sink.clone())?
        .with_identity(StepClock(AtomicU64::new(0)));

    tracer.begin("net", "connect");
    tracer.flush()?;
    tracer.counter("net", "sockets", "queue_depth", 42);
    tracer.end("net", "connect");
    tracer.close()?;

    let lines: Vec<String> = sink.contents().lines().map(str::to_owned).collect();
    insta::assert_debug_snapshot!(lines, @r#"
    [
        "{\"traceEvents\": [",
        "{\"cat\":\"net\",\"pid\":1234,\"tid\":5678,\"ts\":0,\"ph\":\"B\",\"name\":\"connect\"},",
        "{\"cat\":\"net\",\"pid\":1234,\"tid\":5678,\"ts\":250,\"ph\":\"C\",\"name\":\"sockets\",\"args\":{\"queue_depth\":42}},",
        "{\"cat\":\"net\",\"pid\":1234,\"tid\":5678,\"ts\":500,\"ph\":\"E\",\"name\":\"connect\"}",
        "]}",
    ]
    "#);
    Ok(())
}
