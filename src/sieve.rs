//! # Sieve — Segmented Partial Sieve over Arbitrary-Precision Intervals
//!
//! Fills a [`BitInterval`] covering `[start, start + length)` by marking every
//! odd multiple of every odd prime `p <= depth`. Survivors are "not known
//! composite up to `depth`"; callers confirm them with the primality oracle,
//! or skip confirmation when `depth >= sqrt(high)`.
//!
//! ## Algorithm
//!
//! Primes are consumed in increasing order from a lazy [`PrimeIterator`] and
//! handled in four regimes:
//!
//! 1. **Word tiling.** The smallest primes are marked in a 3-word prefix. The
//!    marked pattern of primes `3..q` is periodic in `3·5·…·q` slots, so the
//!    prefix is copied `q` times (whole-word copies) before marking `q`. Once
//!    the next prefix would exceed the buffer the pattern is tiled across the
//!    whole bitmap. This replaces the O(len/p) marking passes of the
//!    densest primes with O(len) word copies.
//! 2. **Paired primes.** While both primes are below 2^32, one reduction of
//!    the big start modulo `p1·p2` (a single 64-bit value) yields both
//!    starting positions, halving the number of big-integer divisions.
//! 3. **Single primes.** `start mod p` through GMP's single-limb remainder.
//! 4. **Wide primes.** Primes at or above 2^32 cannot use the 32-bit
//!    remainder path; their position comes from a multi-limb division.
//!
//! Positions are offsets from the even base `start - 1`, so the first
//! multiple of `p` above the base sits at offset `p - (base mod p)`.
//!
//! ## Complexity
//!
//! O(length · log log depth + π(depth)) word operations, plus one big-integer
//! remainder per prime (half that for paired primes).

use rug::Integer;

use crate::bits::BitInterval;
use crate::error::{Result, SieveError};
use crate::primes::{rem_u64, PrimeIterator};

/// Words in the initial tiling prefix.
const TILE_PREFIX_WORDS: usize = 3;

/// Sieve the odd members of `[start, start + length)` by all odd primes up to
/// `depth`.
///
/// `start` must be odd and positive, `length` non-zero (odd lengths round up
/// to even). Primes `p <= depth` lying inside the interval are themselves
/// marked. Re-sieving identical arguments yields an identical bitmap.
pub fn segment_sieve(start: &Integer, length: u64, depth: u64) -> Result<BitInterval> {
    if *start <= 0 || start.is_even() {
        return Err(SieveError::InvalidInterval {
            reason: "start must be odd and positive",
        });
    }
    if length == 0 {
        return Err(SieveError::InvalidInterval {
            reason: "length must be non-zero",
        });
    }
    Ok(sieve_odd_interval(start, length, depth))
}

/// Unchecked core of [`segment_sieve`] for callers that already normalized
/// the interval.
pub(crate) fn sieve_odd_interval(start: &Integer, length: u64, depth: u64) -> BitInterval {
    sieve_with_primes(start, length, depth, PrimeIterator::starting_at(3))
}

/// Sieve core over an increasing source of odd primes.
fn sieve_with_primes<I>(start: &Integer, length: u64, depth: u64, mut primes: I) -> BitInterval
where
    I: Iterator<Item = u64>,
{
    debug_assert!(start.is_odd() && *start > 0 && length > 0);
    let base = Integer::from(start - 1u32);
    let mut comp = BitInterval::new(length);
    let len = comp.len();
    let wlen = comp.word_len();

    let mut next_prime = move || primes.next().unwrap_or(u64::MAX);
    let first_offset = |p: u64| p - rem_u64(&base, p);

    // Tiling: mark into a growing prefix, then replicate it.
    let mut p = next_prime();
    let mut pwlen = wlen.min(TILE_PREFIX_WORDS);
    while p <= depth {
        comp.mark_stride(first_offset(p), p, BitInterval::words_to_offset(pwlen));
        p = next_prime();
        let grown = (pwlen as u64).saturating_mul(p);
        if grown >= wlen as u64 {
            break;
        }
        comp.tile(pwlen, grown as usize);
        pwlen = grown as usize;
    }
    comp.tile(pwlen, wlen);

    // Paired primes share one remainder modulo p1*p2.
    let pair_limit = depth.min(u64::from(u32::MAX));
    let mut p1 = p;
    let mut p2 = next_prime();
    while p2 <= pair_limit {
        let r = rem_u64(&base, p1 * p2);
        comp.mark_stride(p1 - r % p1, p1, len);
        comp.mark_stride(p2 - r % p2, p2, len);
        p1 = next_prime();
        p2 = next_prime();
    }
    if p1 <= depth {
        comp.mark_stride(first_offset(p1), p1, len);
    }

    // Single primes; rem_u64 switches to multi-limb division at 2^32.
    let mut p = p2;
    while p <= depth {
        comp.mark_stride(first_offset(p), p, len);
        p = next_prime();
    }
    comp
}
