//! # Stepper — Next/Previous Prime and Gaps Around a Point
//!
//! Single-point prime searches, each with a small-input and a large-input
//! strategy:
//!
//! - **Wheel stepping** (up to `next_sieve_bits` / `prev_sieve_bits`): walk
//!   the residues coprime to 30 using precomputed increments, while carrying
//!   `n mod 223092870` (= 2·3·5·…·23) in a native word so multiples of
//!   7..23 are rejected without touching the big integer. Survivors go
//!   through [`is_prob_prime`].
//! - **Sieve search** (larger inputs): sieve a one-sided window of about
//!   `merit` expected gaps to the [`nps_depth`](crate::policy::nps_depth)
//!   and BPSW-test survivors in search order. An empty window (a gap wider
//!   than the window) moves the window along by its width.
//!
//! [`surround_primes`] sieves a two-sided window and walks outward from `n`
//! in both directions at once, doubling the window's merit on a miss.

use rug::{Assign, Integer};
use tracing::debug;

use crate::context::PrimeContext;
use crate::error::{Result, SieveError};
use crate::oracle::{is_bpsw, miller_rabin};
use crate::policy::{gap_window, ln_integer, next_window, prev_window};
use crate::pretest::is_prob_prime;
use crate::primes::rem_u64;
use crate::sieve::sieve_odd_interval;

/// Next residue coprime to 30 after `m mod 30` (29 wraps to 1).
const NEXT_WHEEL: [u8; 30] = [
    1, 7, 7, 7, 7, 7, 7, 11, 11, 11, 11, 13, 13, 17, 17, 17, 17, 19, 19, 23, 23, 23, 23, 29, 29,
    29, 29, 29, 29, 1,
];
/// Previous residue coprime to 30 before `m mod 30`.
const PREV_WHEEL: [u8; 30] = [
    29, 29, 1, 1, 1, 1, 1, 1, 7, 7, 7, 7, 11, 11, 13, 13, 13, 13, 17, 17, 19, 19, 19, 19, 23, 23,
    23, 23, 23, 23,
];
/// Distance from `m mod 30` to `NEXT_WHEEL[m]`.
const WHEEL_ADVANCE: [u8; 30] = [
    1, 6, 5, 4, 3, 2, 1, 4, 3, 2, 1, 2, 1, 4, 3, 2, 1, 2, 1, 4, 3, 2, 1, 6, 5, 4, 3, 2, 1, 2,
];
/// Distance from `m mod 30` back to `PREV_WHEEL[m]`.
const WHEEL_RETREAT: [u8; 30] = [
    1, 2, 1, 2, 3, 4, 5, 6, 1, 2, 3, 4, 1, 2, 1, 2, 3, 4, 1, 2, 1, 2, 3, 4, 1, 2, 3, 4, 5, 6,
];

/// 2·3·5·7·11·13·17·19·23.
const WHEEL_MODULUS: u64 = 223_092_870;

#[inline]
fn coprime_to_7_through_23(r: u64) -> bool {
    r % 7 != 0 && r % 11 != 0 && r % 13 != 0 && r % 17 != 0 && r % 19 != 0 && r % 23 != 0
}

/// Smallest prime strictly greater than `n`.
pub fn next_prime(ctx: &PrimeContext, n: &Integer) -> Integer {
    if *n < 29 {
        let m = if *n < 2 {
            2
        } else {
            match n.to_u32().unwrap_or(0) {
                2 => 3,
                3 | 4 => 5,
                m => u32::from(NEXT_WHEEL[m as usize]),
            }
        };
        return Integer::from(m);
    }
    if n.significant_bits() > ctx.config().next_sieve_bits {
        return next_prime_with_sieve(ctx, n);
    }

    let mut r = rem_u64(n, WHEEL_MODULUS);
    let mut m = (r % 30) as usize;
    let mut candidate = n.clone();
    loop {
        let skip = WHEEL_ADVANCE[m];
        candidate += u32::from(skip);
        r += u64::from(skip);
        m = usize::from(NEXT_WHEEL[m]);
        if coprime_to_7_through_23(r) && is_prob_prime(ctx, &candidate) {
            return candidate;
        }
    }
}

/// Largest prime strictly less than `n`.
///
/// Fails with [`SieveError::NoPrimeBelow`] when `n <= 2`.
pub fn prev_prime(ctx: &PrimeContext, n: &Integer) -> Result<Integer> {
    if *n <= 2 {
        return Err(SieveError::NoPrimeBelow { n: n.clone() });
    }
    if *n <= 29 {
        let m = match n.to_u32().unwrap_or(0) {
            3 => 2,
            4 | 5 => 3,
            6 | 7 => 5,
            m => u32::from(PREV_WHEEL[m as usize]),
        };
        return Ok(Integer::from(m));
    }
    if n.significant_bits() > ctx.config().prev_sieve_bits {
        return Ok(prev_prime_with_sieve(ctx, n));
    }

    // Biased up by one modulus so the running remainder never underflows.
    let mut r = rem_u64(n, WHEEL_MODULUS) + WHEEL_MODULUS;
    let mut m = (r % 30) as usize;
    let mut candidate = n.clone();
    loop {
        let skip = WHEEL_RETREAT[m];
        candidate -= u32::from(skip);
        r -= u64::from(skip);
        m = usize::from(PREV_WHEEL[m]);
        if coprime_to_7_through_23(r) && is_prob_prime(ctx, &candidate) {
            return Ok(candidate);
        }
    }
}

fn next_prime_with_sieve(ctx: &PrimeContext, n: &Integer) -> Integer {
    let bits = u64::from(n.significant_bits());
    let window = next_window(bits, ctx.config().next_merit);
    let mut base = Integer::from(n + if n.is_even() { 1u32 } else { 2u32 });
    loop {
        let comp = sieve_odd_interval(&base, window.width, window.depth);
        let mut candidate = Integer::new();
        for i in comp.survivors() {
            candidate.assign(&base - 1u32);
            candidate += i;
            if is_bpsw(&candidate) {
                return candidate;
            }
        }
        debug!(
            bits,
            width = window.width,
            depth = window.depth,
            "no prime in next window, advancing"
        );
        base += window.width;
    }
}

fn prev_prime_with_sieve(ctx: &PrimeContext, n: &Integer) -> Integer {
    let bits = u64::from(n.significant_bits());
    let window = prev_window(bits, ctx.config().next_merit);
    // Highest odd value below n, the last slot of the first window.
    let mut top = Integer::from(n - if n.is_even() { 1u32 } else { 2u32 });
    loop {
        let base = Integer::from(&top - (window.width - 2));
        let comp = sieve_odd_interval(&base, window.width, window.depth);
        let mut candidate = Integer::new();
        for i in comp.survivors_rev() {
            candidate.assign(&base - 1u32);
            candidate += i;
            if is_bpsw(&candidate) {
                return candidate;
            }
        }
        debug!(
            bits,
            width = window.width,
            depth = window.depth,
            "no prime in prev window, retreating"
        );
        top -= window.width;
    }
}

/// Distances `(n - prev_prime(n), next_prime(n) - n)`.
///
/// With `skip_width > 0` candidates are confirmed with a single base-2
/// Miller–Rabin test, and the search stops as soon as one side finds a prime
/// within `skip_width`; a side not yet found is reported as 0.
pub fn surround_primes(ctx: &PrimeContext, n: &Integer, skip_width: u64) -> Result<(u64, u64)> {
    if *n <= 2 {
        return Err(SieveError::NoPrimeBelow { n: n.clone() });
    }
    let bits = n.significant_bits();
    if bits < ctx.config().gap_sieve_bits {
        let prev = prev_prime(ctx, n)?;
        let next = next_prime(ctx, n);
        let before = Integer::from(n - &prev).to_u64().unwrap_or(u64::MAX);
        let after = Integer::from(&next - n).to_u64().unwrap_or(u64::MAX);
        return Ok((before, after));
    }

    let confirm = |t: &Integer| {
        if skip_width == 0 {
            is_bpsw(t)
        } else {
            miller_rabin(t, 2)
        }
    };
    let bits = u64::from(bits);
    let ln_n = ln_integer(n);
    let n_even = n.is_even();
    // Distance from n being examined; n ± j stays odd.
    let mut j: u64 = if n_even { 1 } else { 2 };
    let (mut found_prev, mut found_next) = (0u64, 0u64);
    let mut merits = ctx.config().gap_merit;
    let mut t = Integer::new();

    loop {
        let window = gap_window(bits, ln_n, merits);
        // Odd half-width when n is even keeps the base odd.
        let width = window.width + u64::from(n_even);
        let base = Integer::from(n - width);
        let comp = sieve_odd_interval(&base, 2 * width + 1, window.depth);

        while j < width {
            if found_prev == 0 && !comp.test(width + 1 - j) {
                t.assign(n - j);
                if confirm(&t) {
                    found_prev = j;
                    if found_next != 0 || (skip_width != 0 && j <= skip_width) {
                        break;
                    }
                }
            }
            if found_next == 0 && !comp.test(width + 1 + j) {
                t.assign(n + j);
                if confirm(&t) {
                    found_next = j;
                    if found_prev != 0 || (skip_width != 0 && j <= skip_width) {
                        break;
                    }
                }
            }
            j += 2;
        }

        let both = found_prev != 0 && found_next != 0;
        let close_enough =
            skip_width != 0 && j <= skip_width && (found_prev != 0 || found_next != 0);
        if both || close_enough {
            return Ok((found_prev, found_next));
        }
        merits = merits.saturating_mul(2);
        debug!(bits, merits, width, "gap window exhausted, widening");
    }
}

/// `surround_primes` with full BPSW confirmation on both sides.
pub fn surrounding_gaps(ctx: &PrimeContext, n: &Integer) -> Result<(u64, u64)> {
    surround_primes(ctx, n, 0)
}
