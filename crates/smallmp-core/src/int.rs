//! Integer storage with transparent promotion between inline and
//! kernel-backed representations.
//!
//! An [`Int<N>`] starts life as a static zero and stays inline while its
//! magnitude fits `N` limbs. Arithmetic that would overflow the inline
//! capacity promotes the result slot to a [`DynMag`] automatically; the
//! reverse direction is never taken implicitly by arithmetic, only by
//! [`Int::demote`] or by assignment from a static source.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Add, AddAssign, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use smallmp_kernel as kernel;
use smallmp_kernel::{DynMag, Limb, MagView};
use tracing::trace;

use crate::static_int::{self, StaticInt, OPT_SIZE};
use crate::StorageError;

#[derive(Debug)]
enum Repr<const N: usize> {
    Static(StaticInt<N>),
    Dynamic(DynMag),
}

/// A signed multiprecision integer with `N` limbs of inline storage.
///
/// Exactly one representation is active at a time; the discriminant is the
/// enum tag, and all tag inspection goes through [`Int::is_static`] /
/// [`Int::is_dynamic`]. Copies preserve the storage class of the source.
/// Moving a value out with [`Int::take`] resets the source to a static
/// zero, never to a vacated dynamic state.
#[derive(Debug)]
pub struct Int<const N: usize> {
    repr: Repr<N>,
}

#[derive(Clone, Copy)]
enum BinOp {
    Add,
    Sub,
    Mul,
}

impl<const N: usize> Int<N> {
    /// A static zero.
    #[must_use]
    pub fn new() -> Self {
        const {
            assert!(N >= 1 && N <= 64, "static size must be between 1 and 64 limbs");
        }
        Self {
            repr: Repr::Static(StaticInt::new()),
        }
    }

    /// Build from significant limbs and a sign, choosing static storage
    /// when the value fits.
    #[must_use]
    pub fn from_limbs(limbs: &[Limb], sign: i32) -> Self {
        let mut value = Self::new();
        value.assign_limbs(limbs, sign);
        value
    }

    /// Parse from a string in the given radix (2 to 36).
    pub fn from_str_radix(s: &str, radix: u32) -> Result<Self, StorageError> {
        assert!((2..=36).contains(&radix), "radix must be in 2..=36");
        match kernel::mag_from_str(s, radix) {
            Some((limbs, sign)) => Ok(Self::from_limbs(&limbs, sign)),
            None => Err(StorageError::Parse {
                input: s.into(),
                radix,
            }),
        }
    }

    /// Whether the inline representation is active.
    #[must_use]
    pub fn is_static(&self) -> bool {
        matches!(self.repr, Repr::Static(_))
    }

    /// Whether the kernel-backed representation is active.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self.repr, Repr::Dynamic(_))
    }

    /// Number of significant limbs (0 for zero).
    #[must_use]
    pub fn size(&self) -> usize {
        match &self.repr {
            Repr::Static(s) => s.abs_size(),
            Repr::Dynamic(m) => m.size(),
        }
    }

    /// Sign of the value: `-1`, `0`, or `1`.
    #[must_use]
    pub fn sign(&self) -> i32 {
        match &self.repr {
            Repr::Static(s) => s.sign(),
            Repr::Dynamic(m) => m.sign(),
        }
    }

    /// Whether the value is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        match &self.repr {
            Repr::Static(s) => s.is_zero(),
            Repr::Dynamic(m) => m.sign() == 0,
        }
    }

    fn view(&self) -> MagView<'_> {
        match &self.repr {
            Repr::Static(s) => MagView {
                limbs: s.used_limbs(),
                sign: s.sign(),
            },
            Repr::Dynamic(m) => m.view(),
        }
    }

    /// Switch to dynamic storage, preserving the value.
    ///
    /// Returns `false` without touching the object when the dynamic
    /// representation is already active.
    pub fn promote(&mut self) -> bool {
        self.promote_with_capacity(0)
    }

    /// Like [`Int::promote`], preallocating room for at least `nlimbs`
    /// limbs so a follow-up write does not have to regrow the buffer.
    pub fn promote_with_capacity(&mut self, nlimbs: usize) -> bool {
        let Repr::Static(s) = &self.repr else {
            return false;
        };
        let mut mag = DynMag::with_capacity(nlimbs.max(s.abs_size()));
        mag.set_from_limbs(s.used_limbs(), s.sign());
        trace!(limbs = s.abs_size(), "promoting to dynamic storage");
        self.repr = Repr::Dynamic(mag);
        true
    }

    /// Attempt to switch back to inline storage.
    ///
    /// Returns `false`, leaving value and storage untouched, when the value
    /// does not fit `N` limbs. A no-op returning `true` when the static
    /// representation is already active. The vacated buffer is recycled
    /// through the limb cache.
    pub fn demote(&mut self) -> bool {
        let Repr::Dynamic(mag) = &self.repr else {
            return true;
        };
        if mag.size() > N {
            return false;
        }
        let mut s = StaticInt::new();
        let fits = s.set_from_limbs(mag.limbs(), mag.sign());
        debug_assert!(fits);
        trace!(limbs = mag.size(), "demoting to static storage");
        self.repr = Repr::Static(s);
        true
    }

    /// Move the value out, leaving `self` as a static zero.
    ///
    /// This is the engine-wide move contract: a moved-from integer is the
    /// identity value, not an unspecified husk, and composite types built
    /// from several integers rely on that.
    #[must_use]
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }

    /// Set the value from significant limbs and a sign.
    ///
    /// The current storage class is kept: a dynamic object stays dynamic
    /// even for a one-limb value. A static object promotes only when the
    /// value does not fit.
    pub fn assign_limbs(&mut self, limbs: &[Limb], sign: i32) {
        match &mut self.repr {
            Repr::Static(s) => {
                if !s.set_from_limbs(limbs, sign) {
                    let mut mag = DynMag::with_capacity(limbs.len());
                    mag.set_from_limbs(limbs, sign);
                    self.repr = Repr::Dynamic(mag);
                }
            }
            Repr::Dynamic(m) => m.set_from_limbs(limbs, sign),
        }
    }

    /// Flip the sign in place.
    pub fn negate(&mut self) {
        match &mut self.repr {
            Repr::Static(s) => s.size = -s.size,
            Repr::Dynamic(m) => m.negate(),
        }
    }

    /// `x = x + x` with full operand aliasing.
    pub fn double_in_place(&mut self) {
        if N <= OPT_SIZE {
            if let Repr::Static(s) = &self.repr {
                let s = *s;
                let mut out = StaticInt::new();
                if static_int::static_addsub(&mut out, &s, &s, false) {
                    self.repr = Repr::Static(out);
                    return;
                }
            }
        }
        // Materialize the result before the destructive write.
        let (limbs, sign) = kernel::mag_add(self.view(), self.view());
        self.assign_limbs(&limbs, sign);
    }

    /// `x = x * x` with full operand aliasing.
    pub fn square_in_place(&mut self) {
        if N <= OPT_SIZE {
            if let Repr::Static(s) = &self.repr {
                let s = *s;
                let mut out = StaticInt::new();
                if static_int::static_mul(&mut out, &s, &s) {
                    self.repr = Repr::Static(out);
                    return;
                }
            }
        }
        let (limbs, sign) = kernel::mag_mul(self.view(), self.view());
        self.assign_limbs(&limbs, sign);
    }

    /// The value as a `u64`, if it is non-negative and fits.
    #[must_use]
    pub fn to_u64(&self) -> Option<u64> {
        let v = self.view();
        match (v.sign, v.limbs) {
            (0, _) => Some(0),
            (1, [limb]) => Some(*limb),
            _ => None,
        }
    }

    /// The value as an `i64`, if it fits.
    #[must_use]
    pub fn to_i64(&self) -> Option<i64> {
        let v = self.view();
        match (v.sign, v.limbs) {
            (0, _) => Some(0),
            (1, [limb]) => i64::try_from(*limb).ok(),
            (-1, [limb]) if *limb <= 1 << 63 => {
                #[allow(clippy::cast_possible_wrap)]
                Some(limb.wrapping_neg() as i64)
            }
            _ => None,
        }
    }

    fn from_sign_mag(negative: bool, mag: u128) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let limbs = [mag as Limb, (mag >> 64) as Limb];
        Self::from_limbs(&limbs, if negative { -1 } else { 1 })
    }
}

impl<const N: usize> Default for Int<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Clone for Int<N> {
    /// Deep copy preserving the storage class: a dynamic source yields a
    /// dynamic copy even when the value would fit inline.
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Static(s) => Repr::Static(*s),
            Repr::Dynamic(m) => Repr::Dynamic(m.clone()),
        };
        Self { repr }
    }

    /// Assignment mirrors the source's storage class, reusing the
    /// destination's buffer in the dynamic-to-dynamic case.
    fn clone_from(&mut self, source: &Self) {
        match (&mut self.repr, &source.repr) {
            (Repr::Static(dst), Repr::Static(src)) => *dst = *src,
            (Repr::Dynamic(dst), Repr::Dynamic(src)) => dst.copy_from(src),
            (dst @ Repr::Dynamic(_), Repr::Static(src)) => *dst = Repr::Static(*src),
            (dst @ Repr::Static(_), Repr::Dynamic(src)) => *dst = Repr::Dynamic(src.clone()),
        }
    }
}

macro_rules! int_from_unsigned {
    ($($t:ty),*) => {$(
        impl<const N: usize> From<$t> for Int<N> {
            fn from(v: $t) -> Self {
                Self::from_sign_mag(false, u128::from(v))
            }
        }
    )*};
}

macro_rules! int_from_signed {
    ($($t:ty),*) => {$(
        impl<const N: usize> From<$t> for Int<N> {
            fn from(v: $t) -> Self {
                Self::from_sign_mag(v < 0, u128::from(v.unsigned_abs()))
            }
        }
    )*};
}

int_from_unsigned!(u8, u16, u32, u64);
int_from_signed!(i8, i16, i32, i64);

impl<const N: usize> From<u128> for Int<N> {
    fn from(v: u128) -> Self {
        Self::from_sign_mag(false, v)
    }
}

impl<const N: usize> From<i128> for Int<N> {
    fn from(v: i128) -> Self {
        Self::from_sign_mag(v < 0, v.unsigned_abs())
    }
}

impl<const N: usize> FromStr for Int<N> {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_radix(s, 10)
    }
}

fn apply<const N: usize>(rop: &mut Int<N>, a: &Int<N>, b: &Int<N>, op: BinOp) {
    if N <= OPT_SIZE {
        if let (Repr::Static(dst), Repr::Static(sa), Repr::Static(sb)) =
            (&mut rop.repr, &a.repr, &b.repr)
        {
            let done = match op {
                BinOp::Add => static_int::static_addsub(dst, sa, sb, false),
                BinOp::Sub => static_int::static_addsub(dst, sa, sb, true),
                BinOp::Mul => static_int::static_mul(dst, sa, sb),
            };
            if done {
                return;
            }
        }
    }
    let (limbs, sign) = match op {
        BinOp::Add => kernel::mag_add(a.view(), b.view()),
        BinOp::Sub => kernel::mag_sub(a.view(), b.view()),
        BinOp::Mul => kernel::mag_mul(a.view(), b.view()),
    };
    rop.assign_limbs(&limbs, sign);
}

fn apply_in_place<const N: usize>(lhs: &mut Int<N>, rhs: &Int<N>, op: BinOp) {
    if N <= OPT_SIZE {
        if let (Repr::Static(sa), Repr::Static(sb)) = (&lhs.repr, &rhs.repr) {
            // Copy the operands out so every read completes before the
            // destructive write, whatever the caller aliased.
            let (sa, sb) = (*sa, *sb);
            let mut out = StaticInt::new();
            let done = match op {
                BinOp::Add => static_int::static_addsub(&mut out, &sa, &sb, false),
                BinOp::Sub => static_int::static_addsub(&mut out, &sa, &sb, true),
                BinOp::Mul => static_int::static_mul(&mut out, &sa, &sb),
            };
            if done {
                lhs.repr = Repr::Static(out);
                return;
            }
        }
    }
    let (limbs, sign) = match op {
        BinOp::Add => kernel::mag_add(lhs.view(), rhs.view()),
        BinOp::Sub => kernel::mag_sub(lhs.view(), rhs.view()),
        BinOp::Mul => kernel::mag_mul(lhs.view(), rhs.view()),
    };
    lhs.assign_limbs(&limbs, sign);
}

/// Ternary addition: `rop = a + b`.
///
/// All-static operands take the inline fast path; a result that would
/// overflow `N` limbs promotes `rop` implicitly. A dynamic `rop` stays
/// dynamic regardless of the result's size.
pub fn add<const N: usize>(rop: &mut Int<N>, a: &Int<N>, b: &Int<N>) {
    apply(rop, a, b, BinOp::Add);
}

/// Ternary subtraction: `rop = a - b`. Same storage behavior as [`add`].
pub fn sub<const N: usize>(rop: &mut Int<N>, a: &Int<N>, b: &Int<N>) {
    apply(rop, a, b, BinOp::Sub);
}

/// Ternary multiplication: `rop = a * b`. Same storage behavior as [`add`].
pub fn mul<const N: usize>(rop: &mut Int<N>, a: &Int<N>, b: &Int<N>) {
    apply(rop, a, b, BinOp::Mul);
}

impl<const N: usize> AddAssign<&Int<N>> for Int<N> {
    fn add_assign(&mut self, rhs: &Int<N>) {
        apply_in_place(self, rhs, BinOp::Add);
    }
}

impl<const N: usize> SubAssign<&Int<N>> for Int<N> {
    fn sub_assign(&mut self, rhs: &Int<N>) {
        apply_in_place(self, rhs, BinOp::Sub);
    }
}

impl<const N: usize> MulAssign<&Int<N>> for Int<N> {
    fn mul_assign(&mut self, rhs: &Int<N>) {
        apply_in_place(self, rhs, BinOp::Mul);
    }
}

impl<const N: usize> Add for &Int<N> {
    type Output = Int<N>;

    fn add(self, rhs: Self) -> Int<N> {
        let mut rop = Int::new();
        add(&mut rop, self, rhs);
        rop
    }
}

impl<const N: usize> Sub for &Int<N> {
    type Output = Int<N>;

    fn sub(self, rhs: Self) -> Int<N> {
        let mut rop = Int::new();
        sub(&mut rop, self, rhs);
        rop
    }
}

impl<const N: usize> Mul for &Int<N> {
    type Output = Int<N>;

    fn mul(self, rhs: Self) -> Int<N> {
        let mut rop = Int::new();
        mul(&mut rop, self, rhs);
        rop
    }
}

impl<const N: usize> Neg for &Int<N> {
    type Output = Int<N>;

    fn neg(self) -> Int<N> {
        let mut out = self.clone();
        out.negate();
        out
    }
}

impl<const N: usize> PartialEq for Int<N> {
    fn eq(&self, other: &Self) -> bool {
        kernel::mag_cmp(self.view(), other.view()) == Ordering::Equal
    }
}

impl<const N: usize> Eq for Int<N> {}

impl<const N: usize> PartialOrd for Int<N> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<const N: usize> Ord for Int<N> {
    fn cmp(&self, other: &Self) -> Ordering {
        kernel::mag_cmp(self.view(), other.view())
    }
}

impl<const N: usize> Hash for Int<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // The view is trimmed, so equal values hash identically whatever
        // their storage class.
        let v = self.view();
        v.sign.hash(state);
        v.limbs.hash(state);
    }
}

impl<const N: usize> fmt::Display for Int<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&kernel::mag_to_string(self.view(), 10))
    }
}
