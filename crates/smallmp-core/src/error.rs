//! Error type for the storage engine.
//!
//! Only expected, recoverable conditions surface here. Allocation failure
//! aborts (the host allocator defines no recovery), and storage-tag
//! inconsistencies are programming errors caught by debug assertions.

/// Errors reported by storage-engine operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A requested precision falls outside the kernel's allowed range.
    /// The object the request targeted is left unchanged.
    #[error("precision {requested} is outside the allowed range [{min}, {max}]")]
    PrecisionOutOfRange {
        /// The precision that was asked for.
        requested: i64,
        /// Smallest allowed precision.
        min: i64,
        /// Largest allowed precision.
        max: i64,
    },

    /// A value was constructed from a NaN or infinite float.
    #[error("cannot build a value from a non-finite float")]
    NonFinite,

    /// A string failed to parse as a number in the given radix.
    #[error("'{input}' is not a valid number in base {radix}")]
    Parse {
        /// The rejected input.
        input: String,
        /// The radix parsing was attempted in.
        radix: u32,
    },
}
