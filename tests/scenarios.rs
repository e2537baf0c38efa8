//! End-to-end storage lifecycle tests over the public workspace APIs.
//!
//! Two limbs of inline storage and 64-bit limbs throughout, which is the
//! configuration the inline fast paths are tuned for.

use smallmp_core::{add, Int, Real, MIN_PREC};
use smallmp_kernel::{alloc_limbs, cache_reset_stats, cache_stats, free_limbs};

#[test]
fn default_integer_is_static_zero() {
    let x: Int<2> = Int::new();
    assert!(x.is_static());
    assert!(x.is_zero());
    assert_eq!(x.size(), 0);
    assert_eq!(x.sign(), 0);
}

#[test]
fn three_limb_assignment_promotes() {
    let mut x: Int<2> = Int::new();
    x.assign_limbs(&[1, 1, 1], 1);
    assert!(x.is_dynamic());
    assert_eq!(x.size(), 3);
}

#[test]
fn demote_of_three_limb_value_is_a_reported_noop() {
    let mut x: Int<2> = Int::from_limbs(&[1, 1, 1], 1);
    let before = x.clone();
    assert!(!x.demote());
    assert!(x.is_dynamic());
    assert_eq!(x, before);
}

#[test]
fn small_assignment_does_not_demote() {
    let mut x: Int<2> = Int::from_limbs(&[1, 1, 1], 1);
    x.assign_limbs(&[42], 1);
    assert!(x.is_dynamic());
    assert_eq!(x.size(), 1);
    assert_eq!(x.to_u64(), Some(42));
}

#[test]
fn set_prec_to_current_precision_is_a_noop() {
    let mut r: Real<2> = Real::new();
    assert_eq!(r.prec(), MIN_PREC);
    assert!(r.set_prec(MIN_PREC).is_ok());
    assert!(r.is_static());
    assert_eq!(r.stored_prec(), -MIN_PREC);
}

#[test]
fn released_buffer_satisfies_the_next_allocation() {
    // Warm exactly one 4-limb buffer, then watch the next request hit.
    let buf = alloc_limbs(4);
    free_limbs(buf);
    cache_reset_stats();

    let buf = alloc_limbs(4);
    assert_eq!(buf.len(), 4);
    let stats = cache_stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 0);
}

#[test]
fn full_integer_lifecycle() {
    // Static birth, arithmetic overflow into dynamic, explicit demotion
    // back, with value equality across every transition.
    let mut x: Int<2> = Int::from(u64::MAX);
    let y = x.clone();
    let mut sum: Int<2> = Int::new();
    add(&mut sum, &x, &y);
    assert!(sum.is_static(), "two limbs still fit inline");

    x.square_in_place();
    assert!(x.is_static());
    let before_promotion = x.clone();
    x.square_in_place();
    assert!(x.is_dynamic(), "fourth power of u64::MAX needs four limbs");

    assert_eq!(&before_promotion * &before_promotion, x);
    assert!(!x.demote());

    x.assign_limbs(&[5], -1);
    assert!(x.demote());
    assert!(x.is_static());
    assert_eq!(x.to_i64(), Some(-5));
}

#[test]
fn float_precision_walk_crosses_storage_both_ways() {
    let mut r: Real<2> = Real::from_f64(1.5).unwrap();
    assert!(r.is_static());

    for prec in [MIN_PREC, 64, 128, 129, 1000, 128, MIN_PREC + 1] {
        r.set_prec(prec).unwrap();
        assert_eq!(r.prec(), prec);
        assert_eq!(r.stored_prec() < 0, r.is_static());
        // 1.5 = 0b11 * 2^-1 fits every precision >= 2 exactly.
        assert_eq!(r.to_f64(), 1.5, "value lost at prec {prec}");
    }
}

#[test]
fn moved_from_values_are_usable_zeros() {
    let mut x: Int<2> = Int::from_limbs(&[3, 2, 1], -1);
    let y = x.take();
    assert!(x.is_static());
    assert!(x.is_zero());
    assert!(y.is_dynamic());

    // The moved-from object is a first-class zero, immediately usable.
    let mut sum: Int<2> = Int::new();
    add(&mut sum, &x, &y);
    assert_eq!(sum, y);

    let mut r: Real<2> = Real::from_f64_with_prec(2.25, 500).unwrap();
    let s = r.take();
    assert!(r.is_static());
    assert!(r.is_zero());
    assert_eq!(r.prec(), MIN_PREC);
    assert_eq!(s.to_f64(), 2.25);
}
