//! # smallmp-kernel
//!
//! The big-number kernel boundary of the `smallmp` workspace.
//!
//! The storage engine in `smallmp-core` keeps small values inline and
//! delegates everything else to this crate: heap-backed magnitude buffers
//! (recycled through a per-thread cache), the arithmetic that operates on
//! them, and the arbitrary-precision float handle with its rounding
//! primitive. The arithmetic itself is performed by `num-bigint`; callers
//! only ever see limb slices, signs, and opaque handles.
#![warn(missing_docs)]

pub mod cache;
pub mod mag;
pub mod real;

/// One machine word of a magnitude. Magnitudes are stored least-significant
/// limb first, with no leading zero limbs; zero is the empty sequence.
pub type Limb = u64;

/// Bit width of a [`Limb`].
pub const LIMB_BITS: u32 = Limb::BITS;

pub use cache::{alloc_limbs, cache_clear, cache_reset_stats, cache_stats, free_limbs};
pub use mag::{
    biguint_to_limbs, limbs_to_biguint, mag_add, mag_cmp, mag_from_str, mag_mul, mag_sub,
    mag_to_string, DynMag, MagView,
};
pub use real::{compose_f64, decompose_f64, round_mantissa, DynReal, MAX_PREC, MIN_PREC};
