//! # Twin — Prime Pairs `(n, n + offset)` in an Interval
//!
//! A pair needs both members to survive the sieve, so the sieve runs far
//! deeper than for single primes ([`twin_depth`]) and the interval is
//! extended by `offset` to cover the upper members.
//!
//! Only residues mod 6 that can hold a pair are scanned: for `offset ≡ 2`
//! the lower member is `≡ 5 (mod 6)`, for `offset ≡ 4` it is `≡ 1`, and for
//! `offset ≡ 0` both classes qualify. An odd offset pairs an odd with an even
//! number and never yields anything above 2.
//!
//! Candidates are confirmed with base-2 Miller–Rabin on both members before
//! the costlier Lucas test runs on either.

use rug::{Assign, Integer};

use crate::context::PrimeContext;
use crate::error::{Result, SieveError};
use crate::oracle::{is_strong_lucas_prp, miller_rabin};
use crate::policy::{sqrt_u64, twin_depth};
use crate::pretest::is_prob_prime;
use crate::primes::PrimeIterator;
use crate::range::{check_width, odd_bounds, Origin};
use crate::sieve::sieve_odd_interval;

/// Largest pair offset accepted; the sieve is extended by this much.
pub const MAX_PATTERN_OFFSET: u64 = u32::MAX as u64;

/// Lower members `n` of pairs with `n` and `n + offset` both prime and
/// `low <= n <= high`, as offsets from `low`.
pub fn twin_primes_in_range(
    ctx: &PrimeContext,
    low: &Integer,
    high: &Integer,
    offset: u64,
) -> Result<Vec<u64>> {
    if offset == 0 {
        return Err(SieveError::InvalidPattern(
            "twin offset must be positive".into(),
        ));
    }
    if offset > MAX_PATTERN_OFFSET {
        return Err(SieveError::InvalidPattern(format!(
            "twin offset {} exceeds {}",
            offset, MAX_PATTERN_OFFSET
        )));
    }
    if low > high || offset % 2 == 1 {
        return Ok(Vec::new());
    }
    check_width(low, high)?;
    let origin = Origin::new(low);

    let mut lo = if *low <= 3 { Integer::from(3) } else { low.clone() };
    let mut hi = high.clone();
    odd_bounds(&mut lo, &mut hi);
    if lo > hi {
        return Ok(Vec::new());
    }

    // Residue class of the lower member mod 6, or None for both odd classes.
    let (class, skip) = match offset % 6 {
        2 => (Some(5u64), 6u64),
        4 => (Some(1), 6),
        _ => (None, 2),
    };

    let hbits = u64::from(hi.significant_bits());
    let depth = twin_depth(hbits).min(sqrt_u64(&hi));
    tracing::debug!(offset, hbits, depth, "twin sieve");

    let mut out = Vec::new();
    let mut value = Integer::new();

    // Primes up to the depth mark themselves composite in the sieve.
    if lo <= depth {
        let ulow = lo.to_u64().unwrap_or(3);
        let limit = hi.to_u64().map_or(depth, |h| h.min(depth));
        for p in PrimeIterator::starting_at(ulow).take_while(|&p| p <= limit) {
            value.assign(p);
            value += offset;
            if is_prob_prime(ctx, &value) {
                out.push(origin.of_native(p));
            }
        }
    }

    let length = Integer::from(&hi - &lo).to_u64_wrapping() + 1;
    let comp = sieve_odd_interval(&lo, length + offset, depth);
    let base = Integer::from(&lo - 1u32);
    let start = match class {
        // Offset i names base + i; base is even, so the start is odd.
        Some(c) => (c + 6 - rem_mod6(&base)) % 6,
        None => 1,
    };

    let (mut mr_tests, mut lucas_tests) = (0u64, 0u64);
    let mut upper = Integer::new();
    let mut i = start;
    while i <= length {
        if !comp.test(i) && !comp.test(i + offset) {
            value.assign(&base + i);
            upper.assign(&value + offset);
            mr_tests += 1;
            let found = miller_rabin(&value, 2)
                && miller_rabin(&upper, 2)
                && {
                    lucas_tests += 1;
                    is_strong_lucas_prp(&value) && is_strong_lucas_prp(&upper)
                };
            if found {
                out.push(origin.of(&value));
            }
        }
        i += skip;
    }
    tracing::debug!(mr_tests, lucas_tests, found = out.len(), "twin sieve done");
    Ok(out)
}

fn rem_mod6(n: &Integer) -> u64 {
    u64::from(n.mod_u(6))
}
