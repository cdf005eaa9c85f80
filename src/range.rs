//! # Range — Primes in an Interval
//!
//! Enumerates or counts the primes in `[low, high]` for arbitrarily large
//! bounds. Results are offsets from the caller's `low` (value = low + offset),
//! which keeps them native-sized however large `low` is.
//!
//! ## Strategy
//!
//! - Values wholly below 2·10⁹ with a small `high` (or a range spanning a
//!   factor of 4 or more) come straight from the native [`PrimeIterator`].
//! - Otherwise the interval is sieved to a depth from
//!   [`range_depth`](crate::policy::range_depth). When that depth reaches
//!   `sqrt(high)` (or a wide range of moderately small numbers forces it to)
//!   the sieve is a complete primality test; else survivors are confirmed
//!   with BPSW.
//! - Primes at or below the depth are marked by the sieve as multiples of
//!   themselves, so they are added back natively.
//! - Sieving runs in segments of `count_segment_width` integers, so memory
//!   stays bounded for wide ranges.

use rug::{Assign, Integer};

use crate::context::PrimeContext;
use crate::error::{Result, SieveError};
use crate::oracle::is_bpsw;
use crate::policy::{count_depth, range_depth, range_force_full, sqrt_u64};
use crate::primes::PrimeIterator;
use crate::sieve::sieve_odd_interval;
use crate::stepper::next_prime;

/// Ranges narrower than this are counted by stepping `next_prime`.
const STEP_COUNT_WIDTH: u32 = 100_000;

/// Native fast path bounds for [`sieve_range`].
const NATIVE_HIGH: u64 = 2_000_000_000;
const NATIVE_SMALL_HIGH: u64 = 1_000_000;

/// Converts result values into offsets from the caller's `low`.
pub(crate) struct Origin {
    value: Integer,
    native: Option<u64>,
}

impl Origin {
    pub(crate) fn new(low: &Integer) -> Self {
        Origin {
            value: low.clone(),
            native: low.to_u64(),
        }
    }

    /// Offset of a native value `v >= low`.
    pub(crate) fn of_native(&self, v: u64) -> u64 {
        match self.native {
            Some(o) => v - o,
            None => Integer::from(Integer::from(v) - &self.value).to_u64_wrapping(),
        }
    }

    /// Offset of `v >= low`.
    pub(crate) fn of(&self, v: &Integer) -> u64 {
        Integer::from(v - &self.value).to_u64_wrapping()
    }
}

/// Fails unless every offset in `[low, high]` fits in a `u64`.
pub(crate) fn check_width(low: &Integer, high: &Integer) -> Result<()> {
    let width = Integer::from(high - low);
    if width.significant_bits() > 64 {
        return Err(SieveError::RangeTooWide {
            width_bits: width.significant_bits(),
        });
    }
    Ok(())
}

/// Round even bounds inward to odd ones.
pub(crate) fn odd_bounds(low: &mut Integer, high: &mut Integer) {
    if low.is_even() {
        *low += 1u32;
    }
    if high.is_even() {
        *high -= 1u32;
    }
}

/// Primes in `[low, high]`, or with an explicit `depth` below `sqrt(high)`,
/// the numbers with no prime factor up to `depth` (plus the primes up to
/// `depth` themselves). `depth = 0` picks the depth automatically.
pub fn sieve_range(
    ctx: &PrimeContext,
    low: &Integer,
    high: &Integer,
    depth: u64,
) -> Result<Vec<u64>> {
    if low > high {
        return Ok(Vec::new());
    }
    check_width(low, high)?;
    let origin = Origin::new(low);
    let mut lo = if *low < 2 { Integer::from(2) } else { low.clone() };
    if lo > *high {
        return Ok(Vec::new());
    }

    let width_bits = u64::from(Integer::from(high - &lo).significant_bits());
    let high_bits = u64::from(high.significant_bits());
    let sqrt_high = sqrt_u64(high);

    let mut k = depth;
    let mut test_primality = false;
    let mut complete = false;
    if k == 0 || sqrt_high <= k {
        test_primality = true;
        k = range_depth(high_bits, width_bits);
    }
    let force_full = test_primality && range_force_full(high_bits, width_bits);
    if force_full || sqrt_high <= k {
        k = sqrt_high;
        complete = true;
        test_primality = false;
    }
    tracing::debug!(high_bits, width_bits, depth = k, complete, test_primality, "range sieve");

    if (complete || test_primality) && *high <= NATIVE_HIGH {
        let ulow = lo.to_u64().unwrap_or(2);
        let uhigh = high.to_u64().unwrap_or(NATIVE_HIGH);
        if uhigh < NATIVE_SMALL_HIGH || uhigh / ulow >= 4 {
            return Ok(PrimeIterator::starting_at(ulow)
                .take_while(|&p| p <= uhigh)
                .map(|p| origin.of_native(p))
                .collect());
        }
    }

    let k = k.max(2);
    let mut out = Vec::new();
    if lo <= k {
        let ulow = lo.to_u64().unwrap_or(2);
        let limit = high.to_u64().map_or(k, |h| h.min(k));
        out.extend(
            PrimeIterator::starting_at(ulow)
                .take_while(|&p| p <= limit)
                .map(|p| origin.of_native(p)),
        );
    }

    let mut hi = high.clone();
    odd_bounds(&mut lo, &mut hi);
    let segment = ctx.config().count_segment_width & !1;
    let mut seg_hi = Integer::new();
    let mut value = Integer::new();
    while lo <= hi {
        seg_hi.assign(&lo + segment);
        if seg_hi > hi {
            seg_hi.assign(&hi);
        }
        let length = Integer::from(&seg_hi - &lo).to_u64_wrapping() + 1;
        let comp = sieve_odd_interval(&lo, length, k);
        let shift = origin.of(&lo);
        for i in comp.survivors() {
            if test_primality {
                value.assign(&lo - 1u32);
                value += i;
                if !is_bpsw(&value) {
                    continue;
                }
            }
            out.push(shift + (i - 1));
        }
        lo.assign(&seg_hi + 2u32);
    }
    Ok(out)
}

/// Primes in `[low, high]` as offsets from `low`.
pub fn primes_in_range(ctx: &PrimeContext, low: &Integer, high: &Integer) -> Result<Vec<u64>> {
    sieve_range(ctx, low, high, 0)
}

/// Number of primes in `[low, high]`, without materializing them.
pub fn count_primes_in_range(ctx: &PrimeContext, low: &Integer, high: &Integer) -> Result<u64> {
    if low > high {
        return Ok(0);
    }
    check_width(low, high)?;

    let mut count = 0u64;
    let mut lo = low.clone();
    if lo <= 2 {
        if *high >= 2 {
            count += 1;
        }
        lo.assign(3);
    }
    if lo > *high {
        return Ok(count);
    }

    if Integer::from(&lo + STEP_COUNT_WIDTH) > *high {
        let mut p = next_prime(ctx, &Integer::from(&lo - 1u32));
        while p <= *high {
            count += 1;
            p = next_prime(ctx, &p);
        }
        return Ok(count);
    }

    let high_bits = u64::from(high.significant_bits());
    let sqrt_high = sqrt_u64(high);
    let mut depth = count_depth(high_bits);
    if high_bits < 64 {
        depth = depth.min(sqrt_high);
    }
    let complete = sqrt_high <= depth;

    // Primes up to the depth are sieved away as multiples of themselves.
    if lo <= depth {
        let ulow = lo.to_u64().unwrap_or(3);
        let limit = high.to_u64().map_or(depth, |h| h.min(depth));
        count += PrimeIterator::starting_at(ulow)
            .take_while(|&p| p <= limit)
            .count() as u64;
        lo.assign(depth);
        lo += 1u32;
    }

    let mut hi = high.clone();
    odd_bounds(&mut lo, &mut hi);
    let segment = ctx.config().count_segment_width & !1;
    let mut seg_hi = Integer::new();
    let mut value = Integer::new();
    while lo <= hi {
        seg_hi.assign(&lo + segment);
        if seg_hi > hi {
            seg_hi.assign(&hi);
        }
        let length = Integer::from(&seg_hi - &lo).to_u64_wrapping() + 1;
        let comp = sieve_odd_interval(&lo, length, depth);
        let found = if complete {
            comp.count_survivors()
        } else {
            comp.survivors()
                .filter(|&i| {
                    value.assign(&lo - 1u32);
                    value += i;
                    is_bpsw(&value)
                })
                .count() as u64
        };
        tracing::debug!(length, depth, found, "counted segment");
        count += found;
        lo.assign(&seg_hi + 2u32);
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SieveConfig;
    use crate::primes::generate_primes;

    fn ctx() -> &'static PrimeContext {
        PrimeContext::shared()
    }

    fn int(n: u64) -> Integer {
        Integer::from(n)
    }

    /// Reference enumeration by trial division.
    fn trial_primes(low: u64, high: u64) -> Vec<u64> {
        (low..=high)
            .filter(|&n| n >= 2 && (2..).take_while(|d| d * d <= n).all(|d| n % d != 0))
            .map(|n| n - low)
            .collect()
    }

    #[test]
    fn known_counts() {
        assert_eq!(count_primes_in_range(ctx(), &int(2), &int(100)).unwrap(), 25);
        assert_eq!(count_primes_in_range(ctx(), &int(2), &int(10)).unwrap(), 4);
        assert_eq!(count_primes_in_range(ctx(), &int(0), &int(1)).unwrap(), 0);
        assert_eq!(count_primes_in_range(ctx(), &int(0), &int(2)).unwrap(), 1);
    }

    #[test]
    fn small_ranges_match_trial_division() {
        for &(low, high) in &[(0u64, 100u64), (1, 2), (2, 2), (3, 3), (4, 4), (14, 16), (90, 200)] {
            assert_eq!(
                primes_in_range(ctx(), &int(low), &int(high)).unwrap(),
                trial_primes(low, high),
                "[{}, {}]",
                low,
                high
            );
        }
    }

    /// Ranges that skip the native fast path: high above 10^6 and
    /// high/low < 4, both below and above 2·10⁹.
    #[test]
    fn sieved_ranges_match_trial_division() {
        for &(low, high) in &[
            (1_000_000u64, 1_010_000u64),
            (999_999_000, 1_000_001_000),
            (4_000_000_001, 4_000_020_000),
        ] {
            assert_eq!(
                primes_in_range(ctx(), &int(low), &int(high)).unwrap(),
                trial_primes(low, high),
                "[{}, {}]",
                low,
                high
            );
        }
    }

    /// Offsets are relative to the caller's low even when it is below 2.
    #[test]
    fn offsets_from_negative_low() {
        let got = primes_in_range(ctx(), &Integer::from(-3), &int(7)).unwrap();
        assert_eq!(got, vec![5, 6, 8, 10]);
    }

    #[test]
    fn inverted_and_too_wide() {
        assert!(primes_in_range(ctx(), &int(10), &int(5)).unwrap().is_empty());
        assert_eq!(count_primes_in_range(ctx(), &int(10), &int(5)).unwrap(), 0);
        let huge = Integer::from(1) << 80;
        assert!(matches!(
            primes_in_range(ctx(), &int(0), &huge),
            Err(SieveError::RangeTooWide { width_bits: 81 })
        ));
    }

    /// An explicit shallow depth returns partial-sieve survivors: every odd
    /// number in [100, 130] with no factor 3 or 5.
    #[test]
    fn explicit_depth_returns_survivors() {
        let got = sieve_range(ctx(), &int(100), &int(130), 5).unwrap();
        let expected: Vec<u64> = (100u64..=130)
            .filter(|n| n % 2 == 1 && n % 3 != 0 && n % 5 != 0)
            .map(|n| n - 100)
            .collect();
        assert_eq!(got, expected);
        // A depth at or beyond sqrt(high) is a full prime sieve.
        let full = sieve_range(ctx(), &int(100), &int(130), 1000).unwrap();
        assert_eq!(full, trial_primes(100, 130));
    }

    /// Narrow segments stitch together into the same result as one sieve.
    #[test]
    fn segment_width_does_not_change_results() {
        let narrow = PrimeContext::new(SieveConfig {
            count_segment_width: 1024,
            ..SieveConfig::default()
        })
        .unwrap();
        let low = int(1_000_000_000_000);
        let high = int(1_000_000_020_000);
        let got = primes_in_range(&narrow, &low, &high).unwrap();
        assert_eq!(got, primes_in_range(ctx(), &low, &high).unwrap());
        assert_eq!(got.len() as u64, count_primes_in_range(&narrow, &low, &high).unwrap());
        assert_eq!(
            sieve_range(&narrow, &low, &high, 31).unwrap(),
            sieve_range(ctx(), &low, &high, 31).unwrap()
        );

        let big = (Integer::from(1) << 90) + 1u32;
        let big_high = Integer::from(&big + 5000u32);
        assert_eq!(
            primes_in_range(&narrow, &big, &big_high).unwrap(),
            primes_in_range(ctx(), &big, &big_high).unwrap()
        );
    }

    /// BPSW-confirmed ranges above 2^64 agree with next_prime stepping.
    #[test]
    fn big_range_matches_stepping() {
        let low = (Integer::from(1) << 100) + 7u32;
        let high = Integer::from(&low + 20_000u32);
        let offsets = primes_in_range(ctx(), &low, &high).unwrap();

        let mut stepped = Vec::new();
        let mut p = next_prime(ctx(), &Integer::from(&low - 1u32));
        while p <= high {
            stepped.push(Integer::from(&p - &low).to_u64().unwrap());
            p = next_prime(ctx(), &p);
        }
        assert_eq!(offsets, stepped);
        assert_eq!(
            count_primes_in_range(ctx(), &low, &Integer::from(&low + 200_000u32)).unwrap(),
            primes_in_range(ctx(), &low, &Integer::from(&low + 200_000u32)).unwrap().len() as u64
        );
    }

    /// Multi-segment counting, with and without a complete sieve.
    #[test]
    fn segmented_count_matches_enumeration() {
        let small_segments = PrimeContext::new(SieveConfig {
            count_segment_width: 4096,
            ..SieveConfig::default()
        })
        .unwrap();
        let low = int(1_000_000_000);
        let high = int(1_000_300_000);
        let expected = primes_in_range(ctx(), &low, &high).unwrap().len() as u64;
        assert_eq!(count_primes_in_range(&small_segments, &low, &high).unwrap(), expected);
        assert_eq!(count_primes_in_range(ctx(), &low, &high).unwrap(), expected);

        // pi(10^6) = 78498, counting across the native/sieve boundary.
        assert_eq!(
            count_primes_in_range(&small_segments, &int(0), &int(1_000_000)).unwrap(),
            78_498
        );
        assert_eq!(generate_primes(1_000_000).len(), 78_498);
    }
}
