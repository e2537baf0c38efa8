//! Arbitrary-precision float handle and the shared rounding primitive.
//!
//! A float value is `sign * mant * 2^(exp - prec)` with the mantissa
//! normalized to exactly `prec` significant bits (top bit set) unless the
//! value is zero. Every precision change funnels through
//! [`round_mantissa`], which rounds to nearest with ties to even.

use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};

/// Minimum allowed precision in bits. Strictly positive: the sign of a
/// stored precision doubles as the storage tag in `smallmp-core`, so a
/// precision of zero must never occur.
pub const MIN_PREC: i64 = 2;

/// Maximum allowed precision in bits (kernel ceiling).
pub const MAX_PREC: i64 = 1 << 24;

/// Whether `prec` lies in `[MIN_PREC, MAX_PREC]`.
#[must_use]
pub fn prec_in_range(prec: i64) -> bool {
    (MIN_PREC..=MAX_PREC).contains(&prec)
}

/// Round a normalized mantissa from `from_prec` to `to_prec` significant
/// bits, to nearest with ties to even. Returns the new mantissa and the
/// (possibly carried) exponent.
///
/// A zero mantissa passes through unchanged. Widening shifts in zero bits
/// and is exact; narrowing may round up into `2^to_prec`, in which case the
/// mantissa renormalizes and the exponent grows by one.
#[must_use]
pub fn round_mantissa(mant: &BigUint, from_prec: i64, to_prec: i64, exp: i64) -> (BigUint, i64) {
    if mant.is_zero() {
        return (BigUint::zero(), exp);
    }
    debug_assert_eq!(i64::try_from(mant.bits()).ok(), Some(from_prec));
    if to_prec >= from_prec {
        #[allow(clippy::cast_sign_loss)]
        let widen = (to_prec - from_prec) as u64;
        return (mant << widen, exp);
    }
    #[allow(clippy::cast_sign_loss)]
    let drop = (from_prec - to_prec) as u64;
    let mut q = mant >> drop;
    let rem = mant - (&q << drop);
    let half = BigUint::one() << (drop - 1);
    let q_odd = (&q & BigUint::one()) == BigUint::one();
    if rem > half || (rem == half && q_odd) {
        q += 1u32;
    }
    let mut exp = exp;
    let q_bits = i64::try_from(q.bits()).unwrap_or(i64::MAX);
    if q_bits > to_prec {
        // Rounded up to exactly 2^to_prec.
        q >>= 1u32;
        exp += 1;
    }
    (q, exp)
}

/// Decompose a finite `f64` into `(sign_negative, mantissa, exp)` with the
/// mantissa normalized to its own bit length, so that
/// `value = mant * 2^(exp - mant.bits())`.
///
/// `None` for NaN and infinities. Zero (either sign) decomposes to an
/// unsigned zero.
#[must_use]
pub fn decompose_f64(x: f64) -> Option<(bool, BigUint, i64)> {
    if !x.is_finite() {
        return None;
    }
    if x == 0.0 {
        return Some((false, BigUint::zero(), 0));
    }
    let bits = x.to_bits();
    let neg = bits >> 63 == 1;
    #[allow(clippy::cast_possible_wrap)]
    let biased = ((bits >> 52) & 0x7ff) as i64;
    let frac = bits & ((1u64 << 52) - 1);
    let (m, e) = if biased == 0 {
        // Subnormal.
        (frac, -1074i64)
    } else {
        (frac | (1u64 << 52), biased - 1075)
    };
    let width = i64::from(64 - m.leading_zeros());
    Some((neg, BigUint::from(m), e + width))
}

/// Multiply by a power of two, stepping through the exponent so the scale
/// factor itself never overflows or underflows before the product does.
fn ldexp(x: f64, e: i64) -> f64 {
    if x == 0.0 {
        return 0.0;
    }
    if e > 2000 {
        return f64::INFINITY;
    }
    if e < -2000 {
        return 0.0;
    }
    let mut x = x;
    let mut e = e;
    while e > 1000 {
        x *= (1000f64).exp2();
        e -= 1000;
    }
    while e < -1000 {
        x *= (-1000f64).exp2();
        e += 1000;
    }
    #[allow(clippy::cast_precision_loss)]
    {
        x * (e as f64).exp2()
    }
}

/// Recompose an `f64` from normalized parts, rounding if `prec` exceeds
/// the `f64` significand. Overflowing exponents saturate to infinity and
/// underflowing ones to zero, as in native float arithmetic.
#[must_use]
pub fn compose_f64(sign_neg: bool, mant: &BigUint, prec: i64, exp: i64) -> f64 {
    if mant.is_zero() {
        return 0.0;
    }
    // Renormalize to the f64 significand width first, so the mantissa
    // always converts exactly and only the final scaling can round.
    let target = i64::from(f64::MANTISSA_DIGITS);
    let (m, e) = if prec > target {
        let (m, exp) = round_mantissa(mant, prec, target, exp);
        (m, exp - target)
    } else {
        (mant.clone(), exp - prec)
    };
    let x = ldexp(m.to_f64().unwrap_or(f64::INFINITY), e);
    if sign_neg {
        -x
    } else {
        x
    }
}

/// Kernel-owned arbitrary-precision float (`kernel.float_init` /
/// `kernel.float_set_prec` / `kernel.float_clear`).
///
/// The handle owns its mantissa storage outright; the limb cache is an
/// integer-storage concern and is not involved here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynReal {
    prec: i64,
    sign_neg: bool,
    exp: i64,
    mant: BigUint,
}

impl DynReal {
    /// A zero value carrying the given precision (`kernel.float_init`).
    #[must_use]
    pub fn new(prec: i64) -> Self {
        debug_assert!(prec_in_range(prec));
        Self {
            prec,
            sign_neg: false,
            exp: 0,
            mant: BigUint::zero(),
        }
    }

    /// Precision in bits. Always positive.
    #[must_use]
    pub fn prec(&self) -> i64 {
        self.prec
    }

    /// Whether the value is negative.
    #[must_use]
    pub fn sign_neg(&self) -> bool {
        self.sign_neg
    }

    /// Exponent of the normalized form.
    #[must_use]
    pub fn exp(&self) -> i64 {
        self.exp
    }

    /// Normalized mantissa.
    #[must_use]
    pub fn mant(&self) -> &BigUint {
        &self.mant
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.mant.is_zero()
    }

    /// Change the precision in place, rounding the value
    /// (`kernel.float_set_prec`).
    pub fn set_prec(&mut self, new_prec: i64) {
        debug_assert!(prec_in_range(new_prec));
        let (mant, exp) = round_mantissa(&self.mant, self.prec, new_prec, self.exp);
        self.mant = mant;
        self.exp = exp;
        self.prec = new_prec;
    }

    /// Replace the value with `mant * 2^(exp - from_prec)`, rounded to this
    /// handle's precision.
    pub fn set_from_parts(&mut self, sign_neg: bool, mant: &BigUint, from_prec: i64, exp: i64) {
        let (mant, exp) = round_mantissa(mant, from_prec, self.prec, exp);
        self.sign_neg = sign_neg && !mant.is_zero();
        self.mant = mant;
        self.exp = exp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: u64) -> BigUint {
        BigUint::from(n)
    }

    #[test]
    fn widening_is_exact() {
        let (m, e) = round_mantissa(&big(0b11), 2, 5, 7);
        assert_eq!(m, big(0b11000));
        assert_eq!(e, 7);
    }

    #[test]
    fn narrowing_rounds_to_nearest() {
        // 0b1011 (11) to 3 bits: drops a 1, rounds up to 0b110.
        let (m, e) = round_mantissa(&big(0b1011), 4, 3, 0);
        assert_eq!(m, big(0b110));
        assert_eq!(e, 0);
    }

    #[test]
    fn ties_round_to_even() {
        // 0b101 to 2 bits: tie between 0b10 and 0b11, even wins.
        let (m, _) = round_mantissa(&big(0b101), 3, 2, 0);
        assert_eq!(m, big(0b10));
        // 0b111 to 2 bits: tie rounds up from odd 0b11 to 0b100,
        // which renormalizes.
        let (m, e) = round_mantissa(&big(0b111), 3, 2, 0);
        assert_eq!(m, big(0b10));
        assert_eq!(e, 1);
    }

    #[test]
    fn all_ones_carry_renormalizes() {
        let (m, e) = round_mantissa(&big(0b1111), 4, 3, 10);
        assert_eq!(m, big(0b100));
        assert_eq!(e, 11);
    }

    #[test]
    fn zero_passes_through() {
        let (m, e) = round_mantissa(&BigUint::zero(), 8, 4, 3);
        assert!(m.is_zero());
        assert_eq!(e, 3);
    }

    #[test]
    fn decompose_simple_values() {
        let (neg, m, exp) = decompose_f64(1.0).unwrap();
        assert!(!neg);
        assert_eq!(m, big(1 << 52));
        assert_eq!(exp, 1); // 1.0 = 0.1b * 2^1

        let (neg, m, exp) = decompose_f64(-0.5).unwrap();
        assert!(neg);
        assert_eq!(m, big(1 << 52));
        assert_eq!(exp, 0);
    }

    #[test]
    fn decompose_rejects_non_finite() {
        assert!(decompose_f64(f64::NAN).is_none());
        assert!(decompose_f64(f64::INFINITY).is_none());
        assert!(decompose_f64(f64::NEG_INFINITY).is_none());
    }

    #[test]
    fn compose_inverts_decompose() {
        for &x in &[1.0, -2.5, 0.0, 1234.5678, -1e-300, 3e200] {
            let (neg, m, exp) = decompose_f64(x).unwrap();
            let prec = i64::try_from(m.bits()).unwrap().max(1);
            assert_eq!(compose_f64(neg, &m, prec, exp), x, "x = {x}");
        }
    }

    #[test]
    fn dyn_real_set_prec_rounds_value() {
        let mut r = DynReal::new(53);
        let (neg, m, exp) = decompose_f64(5.0).unwrap();
        r.set_from_parts(neg, &m, i64::try_from(m.bits()).unwrap(), exp);
        assert_eq!(compose_f64(r.sign_neg(), r.mant(), r.prec(), r.exp()), 5.0);

        // 5 = 0b101; at 2 bits it rounds to even, giving 4.
        r.set_prec(2);
        assert_eq!(r.prec(), 2);
        assert_eq!(compose_f64(r.sign_neg(), r.mant(), r.prec(), r.exp()), 4.0);
    }

    #[test]
    fn compose_handles_subnormals() {
        // Smallest positive subnormal, 2^-1074: the scale factor alone
        // would underflow, the stepwise product must not.
        let x = f64::MIN_POSITIVE * f64::EPSILON;
        let (neg, m, exp) = decompose_f64(x).unwrap();
        let width = i64::try_from(m.bits()).unwrap();
        let (m, exp) = round_mantissa(&m, width, 53, exp);
        assert_eq!(compose_f64(neg, &m, 53, exp), x);
    }

    #[test]
    fn compose_handles_precision_beyond_f64() {
        // 1.0 carried at 2000 bits still reads back as 1.0 even though the
        // raw mantissa no longer fits an f64.
        let (_, m, exp) = decompose_f64(1.0).unwrap();
        let (m, exp) = round_mantissa(&m, 53, 2000, exp);
        assert_eq!(compose_f64(false, &m, 2000, exp), 1.0);
    }

    #[test]
    fn dyn_real_new_is_zero() {
        let r = DynReal::new(MIN_PREC);
        assert!(r.is_zero());
        assert!(!r.sign_neg());
        assert_eq!(r.prec(), MIN_PREC);
    }
}
