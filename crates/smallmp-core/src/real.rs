//! Arbitrary-precision float storage keyed on precision.
//!
//! A [`Real<N>`] holds its mantissa inline while the requested precision
//! fits `N` limbs, and in a kernel-owned handle otherwise. The storage tag
//! is the sign of the stored precision: negative means the inline
//! representation is active, positive means the kernel handle is. The
//! effective precision is always the absolute value, and a stored precision
//! of zero never occurs (the minimum precision is strictly positive).

use num_bigint::BigUint;
use num_traits::Zero;
use smallmp_kernel as kernel;
use smallmp_kernel::{biguint_to_limbs, limbs_to_biguint, DynReal, Limb, LIMB_BITS, MAX_PREC, MIN_PREC};
use tracing::trace;

use crate::StorageError;

/// Whether a (positive) precision fits the inline mantissa of `N` limbs.
fn fits_inline<const N: usize>(prec: i64) -> bool {
    #[allow(clippy::cast_sign_loss)]
    let needed = (prec as usize).div_ceil(LIMB_BITS as usize);
    needed <= N
}

/// Inline float representation. The stored precision is the negated
/// effective precision; everything else mirrors the kernel handle.
#[derive(Debug, Clone, Copy)]
struct StaticReal<const N: usize> {
    prec: i64,
    sign_neg: bool,
    exp: i64,
    limbs: [Limb; N],
}

impl<const N: usize> StaticReal<N> {
    fn zero(prec: i64) -> Self {
        debug_assert!(prec > 0);
        Self {
            prec: -prec,
            sign_neg: false,
            exp: 0,
            limbs: [0; N],
        }
    }

    fn from_parts(prec: i64, sign_neg: bool, mant: &BigUint, exp: i64) -> Self {
        debug_assert!(prec > 0 && fits_inline::<N>(prec));
        let digits = biguint_to_limbs(mant);
        debug_assert!(digits.len() <= N);
        let mut limbs = [0; N];
        limbs[..digits.len()].copy_from_slice(&digits);
        let zero = mant.is_zero();
        Self {
            prec: -prec,
            sign_neg: sign_neg && !zero,
            exp: if zero { 0 } else { exp },
            limbs,
        }
    }

    fn effective_prec(&self) -> i64 {
        -self.prec
    }

    fn mant(&self) -> BigUint {
        limbs_to_biguint(&self.limbs)
    }

    fn is_zero(&self) -> bool {
        self.limbs.iter().all(|&l| l == 0)
    }
}

#[derive(Debug)]
enum Repr<const N: usize> {
    Static(StaticReal<N>),
    Dynamic(DynReal),
}

/// An arbitrary-precision float with `N` limbs of inline mantissa storage.
///
/// The precision drives the storage class: [`Real::set_prec`] moves the
/// value between representations as needed, rounding through the kernel's
/// rounding primitive. Requesting the current precision is an immediate
/// no-op. Copies preserve the storage class; [`Real::take`] resets the
/// source to a static zero at the minimum precision.
#[derive(Debug)]
pub struct Real<const N: usize> {
    repr: Repr<N>,
}

impl<const N: usize> Real<N> {
    /// A static zero at the minimum precision.
    #[must_use]
    pub fn new() -> Self {
        const {
            assert!(N >= 1 && N <= 64, "static size must be between 1 and 64 limbs");
        }
        Self {
            repr: Repr::Static(StaticReal::zero(MIN_PREC)),
        }
    }

    /// A zero at the given precision, in whichever storage class that
    /// precision calls for.
    pub fn with_prec(prec: i64) -> Result<Self, StorageError> {
        check_prec(prec)?;
        let repr = if fits_inline::<N>(prec) {
            Repr::Static(StaticReal::zero(prec))
        } else {
            Repr::Dynamic(DynReal::new(prec))
        };
        Ok(Self { repr })
    }

    /// Build from an `f64` at the precision of the `f64` significand.
    pub fn from_f64(x: f64) -> Result<Self, StorageError> {
        Self::from_f64_with_prec(x, i64::from(f64::MANTISSA_DIGITS).max(MIN_PREC))
    }

    /// Build from an `f64`, rounded to the given precision.
    pub fn from_f64_with_prec(x: f64, prec: i64) -> Result<Self, StorageError> {
        check_prec(prec)?;
        let Some((sign_neg, mant, exp)) = kernel::decompose_f64(x) else {
            return Err(StorageError::NonFinite);
        };
        let width = i64::try_from(mant.bits()).unwrap_or(0);
        let (mant, exp) = kernel::round_mantissa(&mant, width, prec, exp);
        let repr = if fits_inline::<N>(prec) {
            Repr::Static(StaticReal::from_parts(prec, sign_neg, &mant, exp))
        } else {
            let mut d = DynReal::new(prec);
            d.set_from_parts(sign_neg, &mant, prec, exp);
            Repr::Dynamic(d)
        };
        Ok(Self { repr })
    }

    /// The signed stored precision. Its sign is the storage tag; use
    /// [`Real::prec`] for the effective precision.
    #[must_use]
    pub fn stored_prec(&self) -> i64 {
        match &self.repr {
            Repr::Static(s) => s.prec,
            Repr::Dynamic(d) => d.prec(),
        }
    }

    /// The effective precision, always in `[MIN_PREC, MAX_PREC]`.
    #[must_use]
    pub fn prec(&self) -> i64 {
        self.stored_prec().abs()
    }

    /// Whether the inline representation is active.
    #[must_use]
    pub fn is_static(&self) -> bool {
        let stored = self.stored_prec();
        debug_assert_ne!(stored, 0);
        debug_assert_eq!(stored < 0, matches!(self.repr, Repr::Static(_)));
        stored < 0
    }

    /// Whether the kernel-backed representation is active.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        !self.is_static()
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match &self.repr {
            Repr::Static(s) => s.is_zero(),
            Repr::Dynamic(d) => d.is_zero(),
        }
    }

    /// Sign of the value: `-1`, `0`, or `1`.
    #[must_use]
    pub fn sign(&self) -> i32 {
        if self.is_zero() {
            return 0;
        }
        let neg = match &self.repr {
            Repr::Static(s) => s.sign_neg,
            Repr::Dynamic(d) => d.sign_neg(),
        };
        if neg {
            -1
        } else {
            1
        }
    }

    /// Change the precision, rounding the value and switching storage
    /// class as needed.
    ///
    /// Requesting the current precision returns immediately with no
    /// rounding pass and no reallocation. An out-of-range precision is
    /// rejected and the object is left untouched.
    pub fn set_prec(&mut self, new_prec: i64) -> Result<(), StorageError> {
        check_prec(new_prec)?;
        if new_prec == self.prec() {
            return Ok(());
        }
        match &mut self.repr {
            Repr::Static(s) => {
                let mant = s.mant();
                let old = s.effective_prec();
                if fits_inline::<N>(new_prec) {
                    let (mant, exp) = kernel::round_mantissa(&mant, old, new_prec, s.exp);
                    *s = StaticReal::from_parts(new_prec, s.sign_neg, &mant, exp);
                } else {
                    let mut d = DynReal::new(new_prec);
                    d.set_from_parts(s.sign_neg, &mant, old, s.exp);
                    trace!(prec = new_prec, "promoting float to dynamic storage");
                    self.repr = Repr::Dynamic(d);
                }
            }
            Repr::Dynamic(d) => {
                if fits_inline::<N>(new_prec) {
                    let (mant, exp) =
                        kernel::round_mantissa(d.mant(), d.prec(), new_prec, d.exp());
                    let s = StaticReal::from_parts(new_prec, d.sign_neg(), &mant, exp);
                    trace!(prec = new_prec, "demoting float to static storage");
                    self.repr = Repr::Static(s);
                } else {
                    d.set_prec(new_prec);
                }
            }
        }
        Ok(())
    }

    /// Move the value out, leaving `self` as a static zero at the minimum
    /// precision. Same move contract as the integer storage.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// The value as an `f64`, rounded if the precision exceeds the `f64`
    /// significand.
    #[must_use]
    pub fn to_f64(&self) -> f64 {
        match &self.repr {
            Repr::Static(s) => kernel::compose_f64(s.sign_neg, &s.mant(), s.effective_prec(), s.exp),
            Repr::Dynamic(d) => kernel::compose_f64(d.sign_neg(), d.mant(), d.prec(), d.exp()),
        }
    }

    /// Canonical `(sign, odd mantissa, exponent)` form for value
    /// comparison across precisions and storage classes.
    fn canonical(&self) -> (bool, BigUint, i64) {
        let (sign_neg, mant, prec, exp) = match &self.repr {
            Repr::Static(s) => (s.sign_neg, s.mant(), s.effective_prec(), s.exp),
            Repr::Dynamic(d) => (d.sign_neg(), d.mant().clone(), d.prec(), d.exp()),
        };
        if mant.is_zero() {
            return (false, BigUint::zero(), 0);
        }
        let tz = mant.trailing_zeros().unwrap_or(0);
        let mant = &mant >> tz;
        (sign_neg, mant, exp - prec + i64::try_from(tz).unwrap_or(0))
    }
}

fn check_prec(prec: i64) -> Result<(), StorageError> {
    if (MIN_PREC..=MAX_PREC).contains(&prec) {
        Ok(())
    } else {
        Err(StorageError::PrecisionOutOfRange {
            requested: prec,
            min: MIN_PREC,
            max: MAX_PREC,
        })
    }
}

impl<const N: usize> Default for Real<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Clone for Real<N> {
    /// Deep copy preserving the storage class.
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Static(s) => Repr::Static(*s),
            Repr::Dynamic(d) => Repr::Dynamic(d.clone()),
        };
        Self { repr }
    }
}

impl<const N: usize> PartialEq for Real<N> {
    /// Value equality, independent of precision and storage class.
    fn eq(&self, other: &Self) -> bool {
        self.canonical() == other.canonical()
    }
}

impl<const N: usize> Eq for Real<N> {}
