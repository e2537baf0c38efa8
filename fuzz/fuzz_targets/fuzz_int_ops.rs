#![no_main]

use libfuzzer_sys::fuzz_target;
use num_bigint::BigInt;
use smallmp_core::{add, mul, sub, Int};

// Drive a random op/transition sequence on one Int<2> and cross-check the
// value against a BigInt oracle after every step.
fuzz_target!(|data: &[u8]| {
    let mut x: Int<2> = Int::new();
    let mut oracle = BigInt::from(0);

    for chunk in data.chunks_exact(9).take(64) {
        let op = chunk[0] % 8;
        let v = i64::from_le_bytes(chunk[1..9].try_into().unwrap());
        let operand: Int<2> = Int::from(v);
        match op {
            0 => {
                let mut r = Int::new();
                add(&mut r, &x, &operand);
                x = r;
                oracle += v;
            }
            1 => {
                x += &operand;
                oracle += v;
            }
            2 => {
                let mut r = Int::new();
                sub(&mut r, &x, &operand);
                x = r;
                oracle -= v;
            }
            3 => {
                x *= &operand;
                oracle *= v;
            }
            4 => {
                x.promote();
            }
            5 => {
                let fit_expected = x.size() <= 2;
                assert_eq!(x.demote(), fit_expected, "demote must report the fit check");
            }
            6 => {
                x.double_in_place();
                oracle *= 2;
            }
            7 => {
                let moved = x.take();
                assert!(x.is_zero(), "moved-from integer must be zero");
                assert!(x.is_static(), "moved-from integer must be static");
                x = moved;
            }
            _ => unreachable!(),
        }
        assert_eq!(x.to_string(), oracle.to_string(), "value diverged at op {op}");
        assert_eq!(x.is_zero(), oracle == BigInt::from(0));
    }
});
