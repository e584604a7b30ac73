//! Timestamp and process/thread identity sources

mod fallback;

#[cfg(target_os = "linux")]
mod linux;

use std::time::Instant;

/// Supplies the clock reading and identifiers stamped on each record
///
/// # RT-Safety Requirements
///
/// Every method runs on the recording hot path and must not block or
/// allocate after a thread's first call.
pub trait IdentitySource: Send + Sync {
    /// Monotonic timestamp in microseconds
    fn timestamp_us(&self) -> u64;

    /// Identifier of the current process
    fn process_id(&self) -> i32;

    /// OS identifier of the calling thread
    fn thread_id(&self) -> u64;
}

/// Identity source backed by the OS
///
/// Timestamps count microseconds since the source was created. Thread ids are
/// the kernel TIDs on Linux and sequential per-thread ids elsewhere.
#[derive(Debug, Clone)]
pub struct SystemIdentity {
    epoch: Instant,
    process_id: i32,
}

impl SystemIdentity {
    /// Create an identity source anchored at the current instant
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            process_id: i32::try_from(std::process::id()).unwrap_or(i32::MAX),
        }
    }
}

impl Default for SystemIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentitySource for SystemIdentity {
    #[inline]
    fn timestamp_us(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_micros()).unwrap_or(u64::MAX)
    }

    #[inline]
    fn process_id(&self) -> i32 {
        self.process_id
    }

    #[inline]
    fn thread_id(&self) -> u64 {
        current_thread_id()
    }
}

/// OS identifier of the calling thread
#[inline]
pub fn current_thread_id() -> u64 {
    #[cfg(target_os = "linux")]
    {
        linux::os_thread_id()
    }

    #[cfg(not(target_os = "linux"))]
    {
        fallback::sequential_thread_id()
    }
}
