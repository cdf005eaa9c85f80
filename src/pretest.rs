//! # Pretest — Cheap Compositeness Rejection Before the Oracle
//!
//! Most candidates reaching a primality test are composite with a small
//! factor. A handful of GCDs against primorials removes them for a fraction
//! of the cost of one Miller–Rabin exponentiation.
//!
//! ## Stages
//!
//! 1. `n < 100000`: exact answer by native trial division ([`is_tiny_prime`]).
//! 2. Even `n`, or a native GCD with `3·5·…·53` or `59·61·…·101` ≠ 1.
//! 3. GCD with the product of all primes below 1009. A number below
//!    `1009²` that survives has no factor below its square root: prime.
//! 4. Above 700 bits, GCD with the primes in `[1009, 40009)`; above 300 bits,
//!    with the primes in `[1009, 10007)`. Both products are built on first use.
//! 5. Above 1600 bits, trial division from 40009 to a bound proportional to
//!    the cost of one full test (see [`crate::policy::trial_division_limit`]).
//!
//! The cached primorials live in [`PrimorialCache`], owned by a
//! [`PrimeContext`] rather than process globals. The two larger products sit
//! behind `OnceLock`, so concurrent first use builds them exactly once.

use std::sync::OnceLock;

use rug::Integer;
use serde::Serialize;

use crate::context::PrimeContext;
use crate::oracle::is_bpsw;
use crate::policy::trial_division_limit;
use crate::primes::{gcd_u64, pn_primorial, rem_u64, PrimeIterator};

/// Primes covered by the eager primorial (all primes below 1009).
pub const SMALL_PRIMORIAL_PRIMES: usize = 168;
/// First prime not covered by the eager primorial.
pub const SMALL_PRIMORIAL_NEXT: u64 = 1009;
/// Primes covered by the medium primorial (all primes below 10007).
pub const MEDIUM_PRIMORIAL_PRIMES: usize = 1229;
/// Primes covered by the large primorial (all primes below 40009).
pub const LARGE_PRIMORIAL_PRIMES: usize = 4203;
/// First prime not covered by the large primorial; trial division starts here.
pub const LARGE_PRIMORIAL_NEXT: u64 = 40009;

/// 3·5·7·…·53.
const NATIVE_GCD_LOW: u64 = 4_127_218_095 * 3_948_078_067;
/// 59·61·…·101.
const NATIVE_GCD_HIGH: u64 = 4_269_855_901 * 1_673_450_759;

const TINY_LIMIT: u32 = 100_000;

/// Verdict of [`pretest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Pretest {
    Composite,
    /// No small factor found; the oracle decides.
    ProbablePrime,
    /// Proven prime by exhaustive small-factor search.
    Prime,
}

/// Primorial products used as GCD filters.
pub struct PrimorialCache {
    small: Integer,
    medium: OnceLock<Integer>,
    large: OnceLock<Integer>,
}

impl PrimorialCache {
    /// Builds the small product eagerly; the others wait for first use.
    pub fn new() -> Self {
        PrimorialCache {
            small: pn_primorial(SMALL_PRIMORIAL_PRIMES),
            medium: OnceLock::new(),
            large: OnceLock::new(),
        }
    }

    /// Product of the primes below 1009.
    pub fn small(&self) -> &Integer {
        &self.small
    }

    /// Product of the primes in `[1009, 10007)`.
    pub fn medium(&self) -> &Integer {
        self.medium
            .get_or_init(|| self.excluding_small(MEDIUM_PRIMORIAL_PRIMES))
    }

    /// Product of the primes in `[1009, 40009)`.
    pub fn large(&self) -> &Integer {
        self.large
            .get_or_init(|| self.excluding_small(LARGE_PRIMORIAL_PRIMES))
    }

    fn excluding_small(&self, primes: usize) -> Integer {
        let mut product = pn_primorial(primes);
        product.div_exact_mut(&self.small);
        tracing::debug!(primes, bits = product.significant_bits(), "built primorial");
        product
    }
}

impl Default for PrimorialCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact primality for `n < 100000` by native trial division.
pub fn is_tiny_prime(n: u32) -> bool {
    if n < 11 {
        return matches!(n, 2 | 3 | 5 | 7);
    }
    if n % 2 == 0 || n % 3 == 0 || n % 5 == 0 || n % 7 == 0 {
        return false;
    }
    if n < 121 {
        return true;
    }
    const SECOND: [u32; 12] = [11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];
    if SECOND.iter().any(|&p| n % p == 0) {
        return false;
    }
    if n < 59 * 59 {
        return true;
    }
    // Wheel-30 candidates from 59 on: 59, 61, 67, 71, 73, 77, 79, 83, ...
    let limit = (n as f64).sqrt() as u32;
    let mut f = 59;
    while f <= limit {
        if n % f == 0 || n % (f + 2) == 0 || n % (f + 8) == 0 || n % (f + 12) == 0 {
            return false;
        }
        f += 14;
        if n % f == 0 || n % (f + 4) == 0 || n % (f + 6) == 0 || n % (f + 10) == 0 {
            return false;
        }
        f += 16;
    }
    true
}

/// Smallest prime factor of `n` in `[from, to]`, if any.
pub fn trial_factor(n: &Integer, from: u64, to: u64) -> Option<u64> {
    PrimeIterator::starting_at(from)
        .take_while(|&p| p <= to)
        .find(|&p| match u32::try_from(p) {
            Ok(p32) => n.is_divisible_u(p32),
            Err(_) => rem_u64(n, p) == 0,
        })
}

fn shares_factor(n: &Integer, product: &Integer) -> bool {
    Integer::from(n.gcd_ref(product)) != 1
}

/// Classify `n` without running a probable-prime test.
pub fn pretest(ctx: &PrimeContext, n: &Integer) -> Pretest {
    if *n < TINY_LIMIT {
        return match n.to_u32() {
            Some(v) if is_tiny_prime(v) => Pretest::Prime,
            _ => Pretest::Composite,
        };
    }
    if n.is_even() {
        return Pretest::Composite;
    }
    for product in [NATIVE_GCD_LOW, NATIVE_GCD_HIGH] {
        if gcd_u64(rem_u64(n, product), product) != 1 {
            return Pretest::Composite;
        }
    }

    let cache = ctx.primorials();
    if shares_factor(n, cache.small()) {
        return Pretest::Composite;
    }
    if *n < SMALL_PRIMORIAL_NEXT * SMALL_PRIMORIAL_NEXT {
        return Pretest::Prime;
    }

    let bits = u64::from(n.significant_bits());
    if bits > 700 {
        if shares_factor(n, cache.large()) {
            return Pretest::Composite;
        }
    } else if bits > 300 && shares_factor(n, cache.medium()) {
        return Pretest::Composite;
    }

    if let Some(limit) = trial_division_limit(bits) {
        if trial_factor(n, LARGE_PRIMORIAL_NEXT, limit).is_some() {
            return Pretest::Composite;
        }
    }
    Pretest::ProbablePrime
}

/// Pretest, then BPSW for anything the pretest could not settle.
pub fn is_prob_prime(ctx: &PrimeContext, n: &Integer) -> bool {
    match pretest(ctx, n) {
        Pretest::Composite => false,
        Pretest::Prime => true,
        Pretest::ProbablePrime => is_bpsw(n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primes::{generate_primes, primorial};

    fn ctx() -> &'static PrimeContext {
        PrimeContext::shared()
    }

    #[test]
    fn native_gcd_constants() {
        let low: u64 = generate_primes(53).iter().skip(1).product();
        assert_eq!(low, NATIVE_GCD_LOW);
        let high: u64 = generate_primes(101).iter().filter(|&&p| p >= 59).product();
        assert_eq!(high, NATIVE_GCD_HIGH);
    }

    #[test]
    fn tiny_prime_matches_sieve() {
        let primes = generate_primes(u64::from(TINY_LIMIT));
        let mut idx = 0;
        for n in 0..TINY_LIMIT {
            let is_p = idx < primes.len() && primes[idx] == u64::from(n);
            if is_p {
                idx += 1;
            }
            assert_eq!(is_tiny_prime(n), is_p, "is_tiny_prime({})", n);
        }
    }

    #[test]
    fn cached_primorials_partition_the_primes() {
        let cache = PrimorialCache::new();
        assert_eq!(*cache.small(), primorial(1008));
        let full = Integer::from(cache.small() * cache.medium());
        assert_eq!(full, primorial(10_006));
        let full = Integer::from(cache.small() * cache.large());
        assert_eq!(full, primorial(40_008));
    }

    /// Verdicts agree with trial division across the tiny/GCD boundary and
    /// below 1009², where surviving the GCD proves primality.
    #[test]
    fn verdicts_below_1009_squared() {
        let primes = generate_primes(200_000);
        for n in 99_990u64..100_400 {
            let expected = primes.binary_search(&n).is_ok();
            let verdict = pretest(ctx(), &Integer::from(n));
            match verdict {
                Pretest::Composite => assert!(!expected, "{} marked composite", n),
                Pretest::Prime => assert!(expected, "{} marked prime", n),
                Pretest::ProbablePrime => panic!("{} below 1009² must be decided", n),
            }
        }
    }

    /// 1009 · 1013 has no factor below 1009, so at 20 bits only BPSW rejects
    /// it. Past 300 and 700 bits the medium and large products catch such
    /// factors.
    #[test]
    fn escalating_gcds() {
        let p = Integer::from(1009u32 * 1013);
        assert_eq!(pretest(ctx(), &p), Pretest::ProbablePrime);
        assert!(!is_prob_prime(ctx(), &p));

        let big = ((Integer::from(1) << 400) + 1u32) * 1013u32;
        assert_eq!(pretest(ctx(), &big), Pretest::Composite);
        let huge = ((Integer::from(1) << 800) + 1u32) * 39_989u32;
        assert_eq!(pretest(ctx(), &huge), Pretest::Composite);
    }

    /// Above 1600 bits, trial division from 40009 catches a factor the
    /// primorials cannot see. 2^2203 - 1 is prime, so 40009 and 65537 are
    /// the only small factors of the products below.
    #[test]
    fn staged_trial_division() {
        let m2203 = (Integer::from(1) << 2203) - 1u32;
        assert_eq!(pretest(ctx(), &m2203), Pretest::ProbablePrime);
        for factor in [40_009u32, 65_537] {
            let n = Integer::from(&m2203 * factor);
            assert!(trial_division_limit(u64::from(n.significant_bits())).unwrap() >= 65_537);
            assert_eq!(
                trial_factor(&n, LARGE_PRIMORIAL_NEXT, 70_000),
                Some(u64::from(factor))
            );
            assert_eq!(pretest(ctx(), &n), Pretest::Composite, "M2203 · {}", factor);
        }
        // A factor beyond the trial bound leaves the verdict to the oracle.
        let far = Integer::from(&m2203 * 1_000_003u32);
        assert_eq!(pretest(ctx(), &far), Pretest::ProbablePrime);
    }

    #[test]
    fn is_prob_prime_known_values() {
        assert!(is_prob_prime(ctx(), &Integer::from(2)));
        assert!(!is_prob_prime(ctx(), &Integer::from(1)));
        assert!(!is_prob_prime(ctx(), &Integer::from(-7)));
        assert!(is_prob_prime(ctx(), &Integer::from(1_000_000_007u64)));
        let m127 = (Integer::from(1) << 127) - 1u32;
        assert!(is_prob_prime(ctx(), &m127));
    }
}
