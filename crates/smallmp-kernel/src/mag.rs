//! Heap-backed integer magnitudes and the arithmetic that operates on them.
//!
//! [`DynMag`] is the dynamic-storage handle: one exclusively-owned limb
//! buffer (recycled through the thread-local cache) plus a signed size
//! field. The arithmetic entry points accept borrowed [`MagView`]s so the
//! storage engine can mix static and dynamic operands freely.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::{BigInt, BigUint, Sign};

use crate::cache::{alloc_limbs, free_limbs};
use crate::Limb;

/// A borrowed view of a signed magnitude: limbs (least-significant first,
/// no leading zeros) and a sign in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy)]
pub struct MagView<'a> {
    /// Significant limbs of the magnitude.
    pub limbs: &'a [Limb],
    /// Sign of the value; `0` iff `limbs` is empty.
    pub sign: i32,
}

impl<'a> MagView<'a> {
    /// Build a view, trimming leading zero limbs and normalizing the sign.
    #[must_use]
    pub fn new(limbs: &'a [Limb], sign: i32) -> Self {
        let used = used_len(limbs);
        let limbs = &limbs[..used];
        let sign = if used == 0 { 0 } else { sign.signum() };
        Self { limbs, sign }
    }
}

fn used_len(limbs: &[Limb]) -> usize {
    limbs.len() - limbs.iter().rev().take_while(|&&l| l == 0).count()
}

/// A dynamically-sized integer magnitude with exclusive buffer ownership.
///
/// The buffer comes from the per-thread limb cache and goes back to it on
/// drop, so repeated promote/demote cycles do not hit the allocator. The
/// signed size field mirrors the static representation: `|size|` significant
/// limbs, sign of `size` = sign of the value, `0` for zero.
pub struct DynMag {
    // `None` only transiently inside `Drop` and buffer swaps.
    buf: Option<Box<[Limb]>>,
    size: i32,
}

impl DynMag {
    /// Create a zero-valued magnitude with room for at least `nlimbs` limbs.
    #[must_use]
    pub fn with_capacity(nlimbs: usize) -> Self {
        Self {
            buf: Some(alloc_limbs(nlimbs.max(1))),
            size: 0,
        }
    }

    /// Number of significant limbs (`kernel.magnitude_size`).
    #[must_use]
    pub fn size(&self) -> usize {
        self.size.unsigned_abs() as usize
    }

    /// Sign of the value: `-1`, `0`, or `1`.
    #[must_use]
    pub fn sign(&self) -> i32 {
        self.size.signum()
    }

    /// The significant limbs, least-significant first.
    #[must_use]
    pub fn limbs(&self) -> &[Limb] {
        &self.buffer()[..self.size()]
    }

    /// Borrowed signed view of the value.
    #[must_use]
    pub fn view(&self) -> MagView<'_> {
        MagView {
            limbs: self.limbs(),
            sign: self.sign(),
        }
    }

    /// Allocated capacity in limbs.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer().len()
    }

    fn buffer(&self) -> &[Limb] {
        self.buf.as_deref().expect("buffer present outside Drop")
    }

    /// Grow the buffer to at least `nlimbs`, preserving the value.
    pub fn grow(&mut self, nlimbs: usize) {
        if self.capacity() >= nlimbs {
            return;
        }
        let mut fresh = alloc_limbs(nlimbs);
        let used = self.size();
        fresh[..used].copy_from_slice(&self.buffer()[..used]);
        if let Some(old) = self.buf.replace(fresh) {
            free_limbs(old);
        }
    }

    /// Set the value from limbs and a sign (`kernel.set_from_limbs`).
    ///
    /// Leading zero limbs are ignored; the buffer grows if needed. The old
    /// value is discarded, so growth does not preserve digits.
    pub fn set_from_limbs(&mut self, limbs: &[Limb], sign: i32) {
        let used = used_len(limbs);
        if self.capacity() < used {
            if let Some(old) = self.buf.replace(alloc_limbs(used)) {
                free_limbs(old);
            }
        }
        let buf = self.buf.as_deref_mut().expect("buffer present outside Drop");
        buf[..used].copy_from_slice(&limbs[..used]);
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let used_i32 = used as i32;
        self.size = if used == 0 { 0 } else { sign.signum() * used_i32 };
    }

    /// Copy the value of `src` into `self` (`kernel.copy`), reusing the
    /// buffer when it is large enough.
    pub fn copy_from(&mut self, src: &DynMag) {
        let limbs: &[Limb] = src.limbs();
        // Aliasing is impossible (exclusive ownership), so a straight
        // limb copy is fine.
        self.set_from_limbs(limbs, src.sign());
    }

    /// Flip the sign of the value.
    pub fn negate(&mut self) {
        self.size = -self.size;
    }

    /// The value as an unsigned `BigUint` magnitude.
    #[must_use]
    pub fn to_biguint(&self) -> BigUint {
        limbs_to_biguint(self.limbs())
    }
}

impl Clone for DynMag {
    /// Deep copy: a fresh buffer sized to the source's significant limbs.
    /// The source's buffer is never shared.
    fn clone(&self) -> Self {
        let mut copy = Self::with_capacity(self.size());
        copy.copy_from(self);
        copy
    }
}

impl Drop for DynMag {
    fn drop(&mut self) {
        if let Some(buf) = self.buf.take() {
            free_limbs(buf);
        }
    }
}

impl fmt::Debug for DynMag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynMag")
            .field("sign", &self.sign())
            .field("limbs", &self.limbs())
            .field("capacity", &self.capacity())
            .finish()
    }
}

/// Convert little-endian limbs to a `BigUint`.
#[must_use]
pub fn limbs_to_biguint(limbs: &[Limb]) -> BigUint {
    let bytes: Vec<u8> = limbs.iter().flat_map(|l| l.to_le_bytes()).collect();
    BigUint::from_bytes_le(&bytes)
}

/// Convert a `BigUint` to little-endian limbs with no leading zeros.
#[must_use]
pub fn biguint_to_limbs(n: &BigUint) -> Vec<Limb> {
    n.to_u64_digits()
}

fn to_bigint(v: MagView<'_>) -> BigInt {
    let mag = limbs_to_biguint(v.limbs);
    let sign = match v.sign.cmp(&0) {
        Ordering::Less => Sign::Minus,
        Ordering::Equal => Sign::NoSign,
        Ordering::Greater => Sign::Plus,
    };
    BigInt::from_biguint(sign, mag)
}

fn from_bigint(n: &BigInt) -> (Vec<Limb>, i32) {
    let sign = match n.sign() {
        Sign::Minus => -1,
        Sign::NoSign => 0,
        Sign::Plus => 1,
    };
    (biguint_to_limbs(n.magnitude()), sign)
}

/// Signed addition of two magnitudes.
#[must_use]
pub fn mag_add(a: MagView<'_>, b: MagView<'_>) -> (Vec<Limb>, i32) {
    from_bigint(&(to_bigint(a) + to_bigint(b)))
}

/// Signed subtraction `a - b`.
#[must_use]
pub fn mag_sub(a: MagView<'_>, b: MagView<'_>) -> (Vec<Limb>, i32) {
    from_bigint(&(to_bigint(a) - to_bigint(b)))
}

/// Signed multiplication of two magnitudes.
#[must_use]
pub fn mag_mul(a: MagView<'_>, b: MagView<'_>) -> (Vec<Limb>, i32) {
    from_bigint(&(to_bigint(a) * to_bigint(b)))
}

/// Signed three-way comparison.
#[must_use]
pub fn mag_cmp(a: MagView<'_>, b: MagView<'_>) -> Ordering {
    // Cheap discriminations first; only equal-shape operands need digits.
    match a.sign.cmp(&b.sign) {
        Ordering::Equal => {}
        other => return other,
    }
    if a.sign == 0 {
        return Ordering::Equal;
    }
    let mag_ord = match a.limbs.len().cmp(&b.limbs.len()) {
        Ordering::Equal => a.limbs.iter().rev().cmp(b.limbs.iter().rev()),
        other => other,
    };
    if a.sign > 0 {
        mag_ord
    } else {
        mag_ord.reverse()
    }
}

/// Parse a signed integer in the given radix into limbs and a sign.
///
/// `None` if the string is not a valid number in that radix.
#[must_use]
pub fn mag_from_str(s: &str, radix: u32) -> Option<(Vec<Limb>, i32)> {
    let n = BigInt::parse_bytes(s.as_bytes(), radix)?;
    Some(from_bigint(&n))
}

/// Format a signed magnitude in the given radix.
#[must_use]
pub fn mag_to_string(v: MagView<'_>, radix: u32) -> String {
    to_bigint(v).to_str_radix(radix)
}
