//! Linux thread identity

use std::path::Path;

thread_local! {
    static OS_TID: u64 = read_os_tid().unwrap_or_else(super::fallback::sequential_thread_id);
}

/// Kernel TID of the calling thread, resolved once per thread
#[inline]
pub(crate) fn os_thread_id() -> u64 {
    OS_TID.with(|tid| *tid)
}

/// Resolve the TID from the `/proc/thread-self` link (`<pid>/task/<tid>`)
fn read_os_tid() -> Option<u64> {
    let target = std::fs::read_link("/proc/thread-self").ok()?;
    parse_task_link(&target)
}

fn parse_task_link(target: &Path) -> Option<u64> {
    target.file_name()?.to_str()?.parse().ok()
}
