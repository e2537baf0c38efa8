//! # smallmp-core
//!
//! Hybrid static/dynamic storage for multiprecision values.
//!
//! [`Int<N>`] keeps integers of up to `N` limbs inline with no heap
//! allocation and transparently promotes to a kernel-managed buffer when a
//! value outgrows that; [`Real<N>`] does the same for arbitrary-precision
//! floats, keyed on the requested precision. Buffer churn between the two
//! representations is absorbed by the per-thread recycling cache in
//! `smallmp-kernel`.

pub mod error;
pub mod int;
pub mod real;
pub(crate) mod static_int;

pub use error::StorageError;
pub use int::{add, mul, sub, Int};
pub use real::Real;
pub use smallmp_kernel::{Limb, LIMB_BITS, MAX_PREC, MIN_PREC};
