//! Property-based tests for segprime's search routines.
//!
//! These tests use `proptest` to check invariants across randomly generated
//! inputs rather than fixed known values.
//!
//! # How to run
//!
//! ```bash
//! # Run all property tests:
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing:
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! # Testing strategy
//!
//! - **Stepper**: next/prev brackets, no prime skipped, on both native-sized
//!   and multi-limb inputs.
//! - **Ranges**: enumeration against trial division, count against
//!   enumeration, partial-depth survivors.
//! - **Constellations**: every reported member confirmed independently by
//!   GMP's own probable-prime test.
//! - **Sieve**: re-sieving is bit-identical.
//!
//! Each property is named `prop_<function>_<invariant>`.

mod common;

use proptest::prelude::*;
use rug::integer::IsPrime;
use rug::Integer;
use segprime::{
    cluster_primes_in_range, count_primes_in_range, is_bpsw, next_prime, prev_prime,
    primes_in_range, segment_sieve, sieve_range, twin_primes_in_range, PrimeContext,
};

fn ctx() -> &'static PrimeContext {
    PrimeContext::shared()
}

/// Independent confirmation through GMP rather than our oracle.
fn gmp_prime(n: &Integer) -> bool {
    n.is_probably_prime(30) != IsPrime::No
}

// == Stepper ===================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// `prev(next(n)) <= n < next(n)`, both prime, nothing prime in between.
    #[test]
    fn prop_next_prime_brackets_native(n in 3u64..1_000_000_000_000u64) {
        let n = Integer::from(n);
        let p = next_prime(ctx(), &n);
        prop_assert!(p > n);
        prop_assert!(gmp_prime(&p));
        let q = prev_prime(ctx(), &p).unwrap();
        prop_assert!(q <= n);
        prop_assert!(gmp_prime(&q));
        let mut m = Integer::from(&n + 1u32);
        while m < p {
            prop_assert!(!is_bpsw(&m), "{} skipped", m);
            m += 1u32;
        }
    }

    #[test]
    fn prop_prev_prime_is_largest_below(n in 3u64..u64::MAX) {
        let n = Integer::from(n);
        let q = prev_prime(ctx(), &n).unwrap();
        prop_assert!(q < n);
        prop_assert!(gmp_prime(&q));
        let mut m = Integer::from(&q + 1u32);
        while m < n {
            prop_assert!(!gmp_prime(&m), "{} skipped", m);
            m += 1u32;
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    /// Multi-limb inputs on both sides of the sieve thresholds.
    #[test]
    fn prop_next_prime_brackets_multi_limb(bits in 65u32..260, low in any::<u64>()) {
        let n = (Integer::from(1) << bits) + low;
        let p = next_prime(ctx(), &n);
        prop_assert!(p > n);
        prop_assert!(gmp_prime(&p));
        let q = prev_prime(ctx(), &p).unwrap();
        prop_assert!(q <= n);
        prop_assert!(gmp_prime(&q));
    }
}

// == Ranges ====================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_primes_in_range_matches_trial_division(
        low in 0u64..1_000_000_000u64,
        width in 0u64..3000,
    ) {
        let high = low + width;
        let got = primes_in_range(ctx(), &Integer::from(low), &Integer::from(high)).unwrap();
        prop_assert_eq!(got, common::naive_primes(low, high));
    }

    #[test]
    fn prop_count_primes_matches_enumeration(
        low in 0u64..4_000_000_000u64,
        width in 0u64..300_000,
    ) {
        let (lo, hi) = (Integer::from(low), Integer::from(low + width));
        let listed = primes_in_range(ctx(), &lo, &hi).unwrap().len() as u64;
        prop_assert_eq!(count_primes_in_range(ctx(), &lo, &hi).unwrap(), listed);
    }

    /// With a shallow explicit depth, survivors above the depth have no prime
    /// factor up to it.
    #[test]
    fn prop_sieve_range_partial_survivors(
        low in 1_000_000u64..1_000_000_000_000u64,
        depth in 3u64..500,
    ) {
        let high = low + 2000;
        let got = sieve_range(ctx(), &Integer::from(low), &Integer::from(high), depth).unwrap();
        for o in got {
            let v = low + o;
            prop_assert!(v <= high);
            prop_assert!((2..=depth).all(|d| v % d != 0), "{} has a factor <= {}", v, depth);
        }
    }
}

// == Constellations ============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn prop_cluster_members_all_prime(
        low in 0u64..1_000_000_000_000u64,
        width in 0u64..200_000,
    ) {
        let pattern = [0u64, 2, 6, 8];
        let base = Integer::from(low);
        let got = cluster_primes_in_range(ctx(), &base, &Integer::from(low + width), &pattern)
            .unwrap();
        for o in got {
            prop_assert!(o <= width);
            for c in pattern {
                prop_assert!(gmp_prime(&Integer::from(low + o + c)));
            }
        }
    }

    #[test]
    fn prop_twin_primes_both_members_prime(
        low in 0u64..1_000_000_000_000u64,
        width in 0u64..100_000,
        half in 1u64..20,
    ) {
        let offset = 2 * half;
        let got = twin_primes_in_range(
            ctx(),
            &Integer::from(low),
            &Integer::from(low + width),
            offset,
        )
        .unwrap();
        prop_assert!(got.windows(2).all(|w| w[0] < w[1]));
        for o in got {
            prop_assert!(gmp_prime(&Integer::from(low + o)));
            prop_assert!(gmp_prime(&Integer::from(low + o + offset)));
        }
    }

    /// An odd offset pairs an even member with an odd one: nothing to find.
    #[test]
    fn prop_twin_odd_offset_is_empty(low in 0u64..1_000_000_000u64, half in 0u64..50) {
        let got = twin_primes_in_range(
            ctx(),
            &Integer::from(low),
            &Integer::from(low + 100_000),
            2 * half + 1,
        )
        .unwrap();
        prop_assert!(got.is_empty());
    }
}

// == Sieve =====================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_segment_sieve_is_idempotent(
        start in 0u64..1_000_000_000_000u64,
        length in 1u64..50_000,
        depth in 0u64..100_000,
    ) {
        let start = Integer::from(start | 1);
        let a = segment_sieve(&start, length, depth).unwrap();
        let b = segment_sieve(&start, length, depth).unwrap();
        prop_assert_eq!(a, b);
    }
}
