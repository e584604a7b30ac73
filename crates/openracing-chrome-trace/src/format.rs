//! Chrome trace JSON formatting
//!
//! Strings are written verbatim. Category, name, argument keys and argument
//! values are expected to be JSON-safe; the recorder does not escape them.

use crate::{EventRecord, TraceArg};
use core::fmt::{self, Write};

/// Written when the trace file is opened
pub const PREAMBLE: &str = "{\"traceEvents\": [\n";

/// Written between consecutive event objects
pub const SEPARATOR: &str = ",\n";

/// Written when the trace file is closed
pub const CLOSING: &str = "\n]}\n";

/// Append one event object to `out`
///
/// Returns `true` if a copied string argument was truncated to
/// `max_copied_arg_chars` characters.
///
/// # Errors
///
/// Propagates the error of the underlying [`fmt::Write`] implementation.
pub fn write_event<W: Write>(
    out: &mut W,
    record: &EventRecord,
    max_copied_arg_chars: usize,
) -> Result<bool, fmt::Error> {
    write!(
        out,
        "{{\"cat\":\"{}\",\"pid\":{},\"tid\":{},\"ts\":{},\"ph\":\"{}\",\"name\":\"{}\"",
        record.category,
        record.process_id,
        record.thread_id,
        record.timestamp_us,
        record.phase.as_char(),
        record.name
    )?;

    let mut truncated = false;
    match &record.arg {
        TraceArg::None => {}
        TraceArg::Int { name, value } => {
            write!(out, ",\"args\":{{\"{name}\":{value}}}")?;
        }
        TraceArg::StrConst { name, value } => {
            write!(out, ",\"args\":{{\"{name}\":\"{value}\"}}")?;
        }
        TraceArg::StrCopy { name, value } => {
            let (value, cut) = truncate_chars(value, max_copied_arg_chars);
            truncated = cut;
            write!(out, ",\"args\":{{\"{name}\":\"{value}\"}}")?;
        }
    }

    out.write_char('}')?;
    Ok(truncated)
}

/// Longest prefix of `s` holding at most `max_chars` characters
///
/// The cut always lands on a character boundary. The flag is `true` if
/// anything was removed.
pub fn truncate_chars(s: &str, max_chars: usize) -> (&str, bool) {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => (s.get(..end).unwrap_or(s), true),
        None => (s, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Phase;

    fn record(phase: Phase, arg: TraceArg) -> EventRecord {
        EventRecord {
            category: "net",
            name: "connect",
            phase,
            timestamp_us: 1234,
            process_id: 42,
            thread_id: 7,
            arg,
        }
    }

    fn render(record: &EventRecord, max: usize) -> (String, bool) {
        let mut out = String::new();
        let truncated = write_event(&mut out, record, max).unwrap_or(false);
        (out, truncated)
    }

    #[test]
    fn test_event_without_args() {
        let (s, truncated) = render(&record(Phase::Begin, TraceArg::None), 300);
        assert_eq!(
            s,
            r#"{"cat":"net","pid":42,"tid":7,"ts":1234,"ph":"B","name":"connect"}"#
        );
        assert!(!truncated);
    }

    #[test]
    fn test_event_with_int_arg() {
        let (s, _) = render(
            &record(Phase::Counter, TraceArg::int("queue_depth", -42)),
            300,
        );
        assert!(s.ends_with(r#""ph":"C","name":"connect","args":{"queue_depth":-42}}"#));
    }

    #[test]
    fn test_const_string_is_not_truncated() {
        let long: &'static str = Box::leak("x".repeat(500).into_boxed_str());
        let (s, truncated) = render(&record(Phase::Instant, TraceArg::str_const("v", long)), 300);
        assert!(!truncated);
        assert!(s.contains(long));
    }

    #[test]
    fn test_copied_string_is_truncated() {
        let long = "y".repeat(301);
        let (s, truncated) = render(&record(Phase::Instant, TraceArg::str_copy("v", long)), 300);
        assert!(truncated);
        let expected = format!(r#""args":{{"v":"{}"}}}}"#, "y".repeat(300));
        assert!(s.ends_with(&expected));
    }

    #[test]
    fn test_truncate_chars_respects_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), ("hé", true));
        assert_eq!(truncate_chars("héllo", 5), ("héllo", false));
        assert_eq!(truncate_chars("", 3), ("", false));
        assert_eq!(truncate_chars("ab", 0), ("", true));
    }
}
