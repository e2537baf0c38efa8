#![no_main]

use libfuzzer_sys::fuzz_target;
use smallmp_core::{Real, MAX_PREC, MIN_PREC};

// Walk random precision changes across the static/dynamic boundary and
// check the precision invariants after every transition.
fuzz_target!(|data: &[u8]| {
    let mut r: Real<2> = Real::from_f64(1.5).unwrap();

    for chunk in data.chunks_exact(8).take(256) {
        let raw = i64::from_le_bytes(chunk.try_into().unwrap());
        let prec = raw.rem_euclid(4096);
        let before_prec = r.prec();
        let before_static = r.is_static();

        if r.set_prec(prec).is_ok() {
            assert!((MIN_PREC..=MAX_PREC).contains(&prec));
            assert_eq!(r.prec(), prec);
        } else {
            // Rejected request: object untouched.
            assert!(!(MIN_PREC..=MAX_PREC).contains(&prec));
            assert_eq!(r.prec(), before_prec);
            assert_eq!(r.is_static(), before_static);
        }

        // The tag convention holds at all times.
        assert_eq!(r.stored_prec() < 0, r.is_static());
        assert_ne!(r.stored_prec(), 0);
        assert!(r.prec() >= MIN_PREC && r.prec() <= MAX_PREC);

        // 1.5 is exactly representable at every precision >= 2.
        assert_eq!(r.to_f64(), 1.5);
    }
});
