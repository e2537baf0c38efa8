//! Bucketed free-list of boxed slices, keyed by exact slice length.

/// Largest buffer length (in words) the default pool will retain.
pub const DEFAULT_MAX_LEN: usize = 10;

/// Maximum number of retained buffers per bucket in the default pool.
pub const DEFAULT_MAX_ENTRIES: usize = 100;

/// Counters describing how a pool has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Acquisitions satisfied from a bucket.
    pub hits: u64,
    /// Acquisitions that fell through to a real allocation.
    pub misses: u64,
    /// Releases that dropped the buffer (too large or bucket full).
    pub evictions: u64,
}

/// A recycling pool for `Box<[T]>` buffers.
///
/// Bucket `k - 1` holds previously released buffers of exactly `k` elements,
/// for `k` in `1..=max_len`. The pool never allocates: `acquire` either pops
/// a recycled buffer or reports a miss, and the caller allocates for real.
/// Released buffers that fit no bucket are dropped immediately.
///
/// The pool holds recycled storage only, never live values. It is a plain
/// single-threaded structure; callers that want one pool per thread wrap it
/// in `thread_local!` + `RefCell`.
pub struct BucketPool<T> {
    buckets: Vec<Vec<Box<[T]>>>,
    max_entries: usize,
    stats: CacheStats,
}

impl<T> BucketPool<T> {
    /// Create a pool retaining buffers of up to `max_len` elements,
    /// at most `max_entries` per bucket.
    #[must_use]
    pub fn new(max_len: usize, max_entries: usize) -> Self {
        let mut buckets = Vec::with_capacity(max_len);
        buckets.resize_with(max_len, Vec::new);
        Self {
            buckets,
            max_entries,
            stats: CacheStats::default(),
        }
    }

    /// Pop a recycled buffer of exactly `len` elements, if one is cached.
    ///
    /// `None` is a miss: `len` is zero, larger than `max_len`, or the bucket
    /// is empty. The caller is expected to allocate a fresh buffer then.
    pub fn acquire(&mut self, len: usize) -> Option<Box<[T]>> {
        if len == 0 || len > self.buckets.len() {
            self.stats.misses += 1;
            return None;
        }
        match self.buckets[len - 1].pop() {
            Some(buf) => {
                self.stats.hits += 1;
                Some(buf)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Return a buffer to the pool.
    ///
    /// The buffer lands in the bucket matching its exact length. Zero-length
    /// buffers, buffers longer than `max_len`, and buffers arriving at a full
    /// bucket are dropped (a real free) and counted as evictions.
    pub fn release(&mut self, buf: Box<[T]>) {
        let len = buf.len();
        if len == 0 || len > self.buckets.len() || self.buckets[len - 1].len() >= self.max_entries {
            self.stats.evictions += 1;
            return;
        }
        let bucket = &mut self.buckets[len - 1];
        bucket.push(buf);
        debug_assert!(bucket.len() <= self.max_entries);
    }

    /// Drain every bucket, really freeing all cached buffers.
    ///
    /// Callable at any time; in particular before process exit, when the
    /// relative teardown order of this pool and the allocator backing the
    /// buffers is not otherwise guaranteed.
    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            bucket.clear();
        }
    }

    /// Largest buffer length this pool retains.
    #[must_use]
    pub fn max_len(&self) -> usize {
        self.buckets.len()
    }

    /// Per-bucket retention cap.
    #[must_use]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Number of buffers currently cached for exactly `len` elements.
    #[must_use]
    pub fn bucket_len(&self, len: usize) -> usize {
        if len == 0 || len > self.buckets.len() {
            return 0;
        }
        self.buckets[len - 1].len()
    }

    /// Total number of cached buffers across all buckets.
    #[must_use]
    pub fn total_cached(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Snapshot of the usage counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    /// Reset the usage counters.
    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }
}

impl<T> Default for BucketPool<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_LEN, DEFAULT_MAX_ENTRIES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boxed(len: usize) -> Box<[u64]> {
        vec![0u64; len].into_boxed_slice()
    }

    #[test]
    fn acquire_from_empty_pool_misses() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        assert!(pool.acquire(4).is_none());
        assert_eq!(pool.stats().misses, 1);
        assert_eq!(pool.stats().hits, 0);
    }

    #[test]
    fn release_then_acquire_hits() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        pool.release(boxed(4));
        assert_eq!(pool.bucket_len(4), 1);

        let buf = pool.acquire(4).expect("bucket should have an entry");
        assert_eq!(buf.len(), 4);
        assert_eq!(pool.stats().hits, 1);
        assert_eq!(pool.bucket_len(4), 0);
    }

    #[test]
    fn acquire_wrong_size_misses() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        pool.release(boxed(4));
        assert!(pool.acquire(5).is_none());
        assert_eq!(pool.bucket_len(4), 1);
    }

    #[test]
    fn oversized_release_evicts() {
        let mut pool: BucketPool<u64> = BucketPool::new(2, 8);
        pool.release(boxed(3));
        assert_eq!(pool.total_cached(), 0);
        assert_eq!(pool.stats().evictions, 1);
    }

    #[test]
    fn zero_length_release_evicts() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        pool.release(boxed(0));
        assert_eq!(pool.total_cached(), 0);
        assert_eq!(pool.stats().evictions, 1);
    }

    #[test]
    fn full_bucket_evicts() {
        let mut pool: BucketPool<u64> = BucketPool::new(4, 2);
        pool.release(boxed(1));
        pool.release(boxed(1));
        pool.release(boxed(1));
        assert_eq!(pool.bucket_len(1), 2);
        assert_eq!(pool.stats().evictions, 1);
    }

    #[test]
    fn acquire_zero_misses() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        assert!(pool.acquire(0).is_none());
    }

    #[test]
    fn clear_drains_all_buckets() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        pool.release(boxed(1));
        pool.release(boxed(2));
        pool.release(boxed(2));
        assert_eq!(pool.total_cached(), 3);
        pool.clear();
        assert_eq!(pool.total_cached(), 0);
        for len in 1..=pool.max_len() {
            assert_eq!(pool.bucket_len(len), 0);
        }
    }

    #[test]
    fn reset_stats_zeroes_counters() {
        let mut pool: BucketPool<u64> = BucketPool::default();
        let _ = pool.acquire(1);
        pool.release(boxed(0));
        pool.reset_stats();
        assert_eq!(pool.stats(), CacheStats::default());
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// One step of a pool workload: release a buffer of the given length,
        /// or acquire one.
        #[derive(Debug, Clone)]
        enum Step {
            Release(usize),
            Acquire(usize),
        }

        fn step_strategy() -> impl Strategy<Value = Step> {
            prop_oneof![
                (0usize..16).prop_map(Step::Release),
                (0usize..16).prop_map(Step::Acquire),
            ]
        }

        proptest! {
            /// No sequence of acquires and releases pushes a bucket past
            /// `max_entries`, and nothing outside `1..=max_len` is retained.
            #[test]
            fn buckets_stay_bounded(steps in proptest::collection::vec(step_strategy(), 1..200)) {
                let mut pool: BucketPool<u64> = BucketPool::new(10, 5);
                for step in steps {
                    match step {
                        Step::Release(len) => pool.release(boxed(len)),
                        Step::Acquire(len) => {
                            let _ = pool.acquire(len);
                        }
                    }
                    for len in 1..=pool.max_len() {
                        prop_assert!(pool.bucket_len(len) <= pool.max_entries());
                    }
                    prop_assert!(pool.total_cached() <= pool.max_len() * pool.max_entries());
                }
            }

            /// An acquired buffer always has exactly the requested length.
            #[test]
            fn acquired_length_is_exact(lens in proptest::collection::vec(1usize..12, 1..50)) {
                let mut pool: BucketPool<u64> = BucketPool::default();
                for &len in &lens {
                    pool.release(boxed(len));
                }
                for &len in &lens {
                    if let Some(buf) = pool.acquire(len) {
                        prop_assert_eq!(buf.len(), len);
                    }
                }
            }
        }
    }
}
