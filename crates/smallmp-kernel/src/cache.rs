//! Per-thread limb buffer cache fronting the allocator.
//!
//! Dynamic magnitudes churn through buffers as values promote, demote, and
//! die. Routing every buffer through a thread-local [`BucketPool`] turns most
//! of that churn into O(1) pops and pushes with no allocator traffic.

use std::cell::RefCell;

use smallmp_memory::{BucketPool, CacheStats, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_LEN};
use tracing::debug;

use crate::Limb;

thread_local! {
    static LIMB_CACHE: RefCell<BucketPool<Limb>> =
        RefCell::new(BucketPool::new(DEFAULT_MAX_LEN, DEFAULT_MAX_ENTRIES));
}

/// Obtain a zeroed limb buffer of exactly `len` limbs.
///
/// Recycled buffers are preferred; the allocator is hit only on a cache
/// miss. Allocation failure aborts, matching the host allocator's own
/// failure model.
#[must_use]
pub fn alloc_limbs(len: usize) -> Box<[Limb]> {
    // try_with: allocation may be requested while the thread-local cache
    // is being torn down; fall through to a plain allocation then.
    let recycled = LIMB_CACHE
        .try_with(|cache| cache.borrow_mut().acquire(len))
        .unwrap_or(None);
    match recycled {
        Some(mut buf) => {
            buf.fill(0);
            buf
        }
        None => vec![0; len].into_boxed_slice(),
    }
}

/// Return a limb buffer to the cache.
///
/// Buffers the cache cannot retain (too long, bucket full) are freed for
/// real. Never panics: releases racing thread teardown simply drop the
/// buffer.
pub fn free_limbs(buf: Box<[Limb]>) {
    let _ = LIMB_CACHE.try_with(|cache| cache.borrow_mut().release(buf));
}

/// Drain this thread's cache, freeing every retained buffer.
///
/// The cache also drains itself on thread teardown, but callers whose
/// teardown interleaves with other process-wide state should invoke this
/// explicitly at a point where the allocator is known to be alive.
pub fn cache_clear() {
    LIMB_CACHE.with(|cache| {
        let mut cache = cache.borrow_mut();
        let cached = cache.total_cached();
        cache.clear();
        debug!(buffers = cached, "limb cache cleared");
    });
}

/// Snapshot of this thread's cache counters.
#[must_use]
pub fn cache_stats() -> CacheStats {
    LIMB_CACHE.with(|cache| cache.borrow().stats())
}

/// Reset this thread's cache counters.
pub fn cache_reset_stats() {
    LIMB_CACHE.with(|cache| cache.borrow_mut().reset_stats());
}
