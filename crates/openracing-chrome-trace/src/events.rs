//! Trace event record definitions

use core::fmt;

/// Chrome trace event phase
///
/// Serialized as the single-character `ph` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Duration begin (`B`)
    Begin,
    /// Duration end (`E`)
    End,
    /// Instant event (`I`)
    Instant,
    /// Counter sample (`C`)
    Counter,
}

impl Phase {
    /// All phases in declaration order
    pub const ALL: [Phase; 4] = [Phase::Begin, Phase::End, Phase::Instant, Phase::Counter];

    /// Returns the chrome-tracing phase character
    #[inline]
    pub const fn as_char(self) -> char {
        match self {
            Phase::Begin => 'B',
            Phase::End => 'E',
            Phase::Instant => 'I',
            Phase::Counter => 'C',
        }
    }

    /// Parse a chrome-tracing phase character
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'B' => Some(Phase::Begin),
            'E' => Some(Phase::End),
            'I' => Some(Phase::Instant),
            'C' => Some(Phase::Counter),
            _ => None,
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Optional single-argument payload attached to an event
///
/// # Ownership
///
/// - [`TraceArg::StrConst`] borrows a `'static` string; nothing is copied.
/// - [`TraceArg::StrCopy`] owns its string from the moment the event is
///   recorded until the event is drained by a flush. Building one allocates,
///   which is the price of keeping data that would not otherwise outlive the
///   caller's stack frame.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TraceArg {
    /// No `args` object
    #[default]
    None,
    /// Integer argument
    Int {
        /// Argument key
        name: &'static str,
        /// Argument value
        value: i64,
    },
    /// Borrowed string argument, emitted verbatim
    StrConst {
        /// Argument key
        name: &'static str,
        /// Argument value
        value: &'static str,
    },
    /// Owned string argument, truncated on output
    StrCopy {
        /// Argument key
        name: &'static str,
        /// Argument value
        value: String,
    },
}

impl TraceArg {
    /// Integer argument
    #[inline]
    pub const fn int(name: &'static str, value: i64) -> Self {
        TraceArg::Int { name, value }
    }

    /// Borrowed string argument
    #[inline]
    pub const fn str_const(name: &'static str, value: &'static str) -> Self {
        TraceArg::StrConst { name, value }
    }

    /// Owned copy of a string argument
    #[inline]
    pub fn str_copy(name: &'static str, value: impl Into<String>) -> Self {
        TraceArg::StrCopy {
            name,
            value: value.into(),
        }
    }

    /// Returns the argument key, if any
    pub fn name(&self) -> Option<&'static str> {
        match self {
            TraceArg::None => None,
            TraceArg::Int { name, .. }
            | TraceArg::StrConst { name, .. }
            | TraceArg::StrCopy { name, .. } => Some(name),
        }
    }

    /// Returns true if no argument is attached
    #[inline]
    pub fn is_none(&self) -> bool {
        matches!(self, TraceArg::None)
    }
}

/// One recorded trace point
///
/// `category` and `name` borrow `'static` strings so the record can sit in a
/// buffer until the next flush without copying them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    /// Grouping label (`cat`)
    pub category: &'static str,
    /// Event name
    pub name: &'static str,
    /// Event phase
    pub phase: Phase,
    /// Monotonic clock reading in microseconds at record time
    pub timestamp_us: u64,
    /// Process identifier captured at record time
    pub process_id: i32,
    /// OS thread identifier captured at record time
    pub thread_id: u64,
    /// Optional payload
    pub arg: TraceArg,
}

impl EventRecord {
    /// Returns true if this record carries an argument
    #[inline]
    pub fn has_arg(&self) -> bool {
        !self.arg.is_none()
    }
}

impl fmt::Display for EventRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}({}, ts={}us, pid={}, tid={})",
            self.category, self.name, self.phase, self.timestamp_us, self.process_id, self.thread_id
        )
    }
}
