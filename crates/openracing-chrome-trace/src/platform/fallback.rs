//! Portable thread identity
//!
//! Used on platforms without a cheap safe TID query, and on Linux when
//! `/proc` is not mounted.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static SEQUENTIAL_TID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Process-unique id assigned to the calling thread on first use
#[inline]
pub(crate) fn sequential_thread_id() -> u64 {
    SEQUENTIAL_TID.with(|tid| *tid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequential_ids() {
        let here = sequential_thread_id();
        assert_ne!(here, 0);
        assert_eq!(here, sequential_thread_id());

        let there = std::thread::spawn(sequential_thread_id)
            .join()
            .unwrap_or(here);
        assert_ne!(here, there);
    }
}
