//! # smallmp-memory
//!
//! Buffer recycling for the `smallmp` workspace.
//!
//! Provides `BucketPool`, a free-list of previously allocated boxed slices
//! bucketed by exact length. Dynamic number storage acquires and releases its
//! limb buffers through a per-thread instance of this pool instead of hitting
//! the allocator on every representation change.
#![warn(missing_docs)]

pub mod pool;

pub use pool::{BucketPool, CacheStats, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_LEN};
